/// The single login shared by club members.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Email is matched case-insensitively, the password exactly.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email_ok = self.email.trim().eq_ignore_ascii_case(email.trim());
        let password_ok = constant_time_eq(self.password.as_bytes(), password.as_bytes());
        email_ok && password_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
