//! Process configuration, read once at startup from `PURCHREQ_*` variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use lettre::message::Mailbox;
use purchreq_auth::Credentials;
use thiserror::Error;

use crate::alert::SmtpSettings;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
const DEFAULT_ARCHIVE_DIR: &str = "sessions";
const DEFAULT_RETENTION_DAYS: i64 = 60;
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub credentials: Credentials,
    pub session_ttl: chrono::Duration,
    pub archive_dir: PathBuf,
    pub retention: chrono::Duration,
    /// Error alert email; `None` leaves alerts disabled.
    pub alerts: Option<SmtpSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = get("PURCHREQ_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "PURCHREQ_BIND",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let email = get("PURCHREQ_LOGIN_EMAIL").unwrap_or_else(|| {
            tracing::warn!("PURCHREQ_LOGIN_EMAIL not set; using insecure dev default");
            "dev@localhost".to_string()
        });
        let password = get("PURCHREQ_LOGIN_PASSWORD").unwrap_or_else(|| {
            tracing::warn!("PURCHREQ_LOGIN_PASSWORD not set; using insecure dev default");
            "dev-password".to_string()
        });

        let ttl_hours = positive_int(
            "PURCHREQ_SESSION_TTL_HOURS",
            get("PURCHREQ_SESSION_TTL_HOURS"),
            DEFAULT_SESSION_TTL_HOURS,
        )?;
        let retention_days = positive_int(
            "PURCHREQ_RETENTION_DAYS",
            get("PURCHREQ_RETENTION_DAYS"),
            DEFAULT_RETENTION_DAYS,
        )?;

        let archive_dir = get("PURCHREQ_ARCHIVE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR));

        let alerts = smtp_settings(&get)?;
        if alerts.is_none() {
            tracing::info!("SMTP settings incomplete; error alert emails disabled");
        }

        Ok(Self {
            bind,
            credentials: Credentials::new(email, password),
            session_ttl: chrono::Duration::hours(ttl_hours),
            archive_dir,
            retention: chrono::Duration::days(retention_days),
            alerts,
        })
    }
}

fn smtp_settings(get: &impl Fn(&str) -> Option<String>) -> Result<Option<SmtpSettings>, ConfigError> {
    let (Some(server), Some(username), Some(password), Some(from), Some(to)) = (
        get("SMTP_SERVER"),
        get("SMTP_USERNAME"),
        get("SMTP_PASSWORD"),
        get("ERROR_EMAIL_FROM"),
        get("ERROR_EMAIL_TO"),
    ) else {
        return Ok(None);
    };

    let port = match get("SMTP_PORT") {
        None => DEFAULT_SMTP_PORT,
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: "SMTP_PORT",
            value: raw.clone(),
            reason: "expected a port number".to_string(),
        })?,
    };

    let from = mailbox("ERROR_EMAIL_FROM", &from)?;
    let to = to
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|addr| mailbox("ERROR_EMAIL_TO", addr))
        .collect::<Result<Vec<_>, _>>()?;
    if to.is_empty() {
        return Ok(None);
    }

    Ok(Some(SmtpSettings {
        server: server.trim().to_string(),
        port,
        username,
        password,
        from,
        to,
    }))
}

fn mailbox(var: &'static str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.trim().parse().map_err(|e: lettre::address::AddressError| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn positive_int(var: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let invalid = |reason: &str| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: reason.to_string(),
    };
    let n: i64 = raw.trim().parse().map_err(|_| invalid("expected an integer"))?;
    if n <= 0 {
        return Err(invalid("must be positive"));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.session_ttl, chrono::Duration::hours(12));
        assert_eq!(cfg.retention, chrono::Duration::days(60));
        assert_eq!(cfg.archive_dir, PathBuf::from("sessions"));
        assert!(cfg.alerts.is_none());
    }

    const SMTP: [(&str, &str); 5] = [
        ("SMTP_SERVER", "smtp.club.example"),
        ("SMTP_USERNAME", "mailer"),
        ("SMTP_PASSWORD", "secret"),
        ("ERROR_EMAIL_FROM", "site@club.example"),
        ("ERROR_EMAIL_TO", "ops@club.example, treasurer@club.example"),
    ];

    #[test]
    fn alerts_enabled_when_smtp_is_complete() {
        let alerts = config(&SMTP).unwrap().alerts.unwrap();
        assert_eq!(alerts.server, "smtp.club.example");
        assert_eq!(alerts.port, 587);
        assert_eq!(alerts.to.len(), 2);
        assert_eq!(alerts.to[1].email.to_string(), "treasurer@club.example");

        let mut vars = SMTP.to_vec();
        vars.push(("SMTP_PORT", "2525"));
        assert_eq!(config(&vars).unwrap().alerts.unwrap().port, 2525);
    }

    #[test]
    fn alerts_disabled_when_any_smtp_setting_is_missing() {
        for skip in 0..SMTP.len() {
            let vars: Vec<_> = SMTP
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, kv)| *kv)
                .collect();
            assert!(config(&vars).unwrap().alerts.is_none(), "missing {}", SMTP[skip].0);
        }
    }

    #[test]
    fn bad_smtp_values_are_config_errors() {
        let mut vars = SMTP.to_vec();
        vars.push(("SMTP_PORT", "smtp"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            ConfigError::Invalid { var: "SMTP_PORT", .. }
        ));

        let mut vars = SMTP.to_vec();
        vars[4] = ("ERROR_EMAIL_TO", "not an address");
        assert!(matches!(
            config(&vars).unwrap_err(),
            ConfigError::Invalid { var: "ERROR_EMAIL_TO", .. }
        ));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let cfg = config(&[
            ("PURCHREQ_BIND", "127.0.0.1:9000"),
            ("PURCHREQ_LOGIN_EMAIL", "finance@club.example"),
            ("PURCHREQ_LOGIN_PASSWORD", "pw"),
            ("PURCHREQ_SESSION_TTL_HOURS", "2"),
            ("PURCHREQ_ARCHIVE_DIR", "/tmp/archive"),
            ("PURCHREQ_RETENTION_DAYS", " 7 "),
        ])
        .unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert!(cfg.credentials.verify("finance@club.example", "pw"));
        assert_eq!(cfg.session_ttl, chrono::Duration::hours(2));
        assert_eq!(cfg.archive_dir, PathBuf::from("/tmp/archive"));
        assert_eq!(cfg.retention, chrono::Duration::days(7));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = config(&[("PURCHREQ_RETENTION_DAYS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PURCHREQ_RETENTION_DAYS", .. }));

        let err = config(&[("PURCHREQ_BIND", "not-an-addr")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PURCHREQ_BIND", .. }));

        let err = config(&[("PURCHREQ_SESSION_TTL_HOURS", "twelve")]).unwrap_err();
        assert!(err.to_string().contains("PURCHREQ_SESSION_TTL_HOURS"));
    }
}
