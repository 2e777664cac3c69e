use chrono::{DateTime, Utc};
use purchreq_auth::Session;

/// Session context for a request (the logged-in shared account).
///
/// Inserted by the session middleware and present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    email: String,
    expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(session: &Session) -> Self {
        Self {
            email: session.email.clone(),
            expires_at: session.expires_at,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
