//! Administrator email for failures the submitter never sees.
//!
//! Enabled only when every `SMTP_*` / `ERROR_EMAIL_*` setting is present.

use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials as SmtpCredentials,
};
use thiserror::Error;

const SUBJECT_PREFIX: &str = "Purchase Request Site - Application Error";

/// SMTP relay and recipients for error alerts.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
}

impl core::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("failed to build alert email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp transport setup failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("failed to send alert email: {0}")]
    Send(String),
}

pub trait ErrorNotifier: Send + Sync {
    fn notify(&self, subject: &str, body: &str) -> Result<(), AlertError>;
}

/// Sends alerts through any `lettre` transport.
pub struct EmailNotifier<T> {
    transport: T,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl<T> EmailNotifier<T> {
    pub fn new(transport: T, from: Mailbox, to: Vec<Mailbox>) -> Self {
        Self {
            transport,
            from,
            to,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl EmailNotifier<SmtpTransport> {
    /// STARTTLS relay with login, as configured.
    pub fn smtp(settings: &SmtpSettings) -> Result<Self, AlertError> {
        let transport = SmtpTransport::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(SmtpCredentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self::new(
            transport,
            settings.from.clone(),
            settings.to.clone(),
        ))
    }
}

impl<T> ErrorNotifier for EmailNotifier<T>
where
    T: Transport + Send + Sync,
    T::Error: core::fmt::Display,
{
    fn notify(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(format!("{SUBJECT_PREFIX}: {subject}"))
            .header(ContentType::TEXT_PLAIN);
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        let message = builder.body(body.to_string())?;

        self.transport
            .send(&message)
            .map_err(|e| AlertError::Send(e.to_string()))?;
        Ok(())
    }
}
