//! Shared application services handed to every handler.

use std::sync::Arc;

use lettre::SmtpTransport;
use purchreq_auth::{Credentials, SessionStore};

use crate::alert::{EmailNotifier, ErrorNotifier};
use crate::archive::{ArchiveSink, LocalArchive};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppServices {
    pub credentials: Credentials,
    pub sessions: Arc<SessionStore>,
    pub archive: Arc<dyn ArchiveSink>,
    pub notifier: Option<Arc<dyn ErrorNotifier>>,
}

impl AppServices {
    pub fn new(
        credentials: Credentials,
        sessions: Arc<SessionStore>,
        archive: Arc<dyn ArchiveSink>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            archive,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ErrorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Services backed by the local session-folder archive.
    pub fn from_config(config: &AppConfig) -> Self {
        let services = Self::new(
            config.credentials.clone(),
            Arc::new(SessionStore::new(config.session_ttl)),
            Arc::new(LocalArchive::new(config.archive_dir.clone())),
        );

        match config
            .alerts
            .as_ref()
            .map(EmailNotifier::<SmtpTransport>::smtp) {
            Some(Ok(notifier)) => services.with_notifier(Arc::new(notifier)),
            Some(Err(e)) => {
                tracing::warn!("error alert emails disabled: {e}");
                services
            }
            None => services,
        }
    }

    /// Email the administrator in the background. Never fails the caller.
    pub fn alert(&self, subject: impl Into<String>, body: impl Into<String>) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        let (subject, body) = (subject.into(), body.into());
        tokio::task::spawn_blocking(move || {
            // warn, not error: an error here would ask for another alert.
            if let Err(e) = notifier.notify(&subject, &body) {
                tracing::warn!("failed to send error alert: {e}");
            }
        });
    }
}
