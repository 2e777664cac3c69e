use serde::{Deserialize, Serialize};

/// Currency mode of an invoice form.
///
/// HOME invoices are reimbursed as-is; FOREIGN invoices need proof of the
/// home-currency amount actually paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Home,
    Foreign,
}

impl Currency {
    /// Code used by the currency selector and written into reports.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Home => "CAD",
            Currency::Foreign => "USD",
        }
    }

    /// Parse a selector value. Anything that is not the foreign code is HOME.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case(Currency::Foreign.code()) {
            Currency::Foreign
        } else {
            Currency::Home
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}
