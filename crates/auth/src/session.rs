use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0.simple(), f)
    }
}

impl core::str::FromStr for SessionToken {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| AuthError::MalformedToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed session token")]
    MalformedToken,

    #[error("unknown session")]
    UnknownSession,

    #[error("session has expired")]
    Expired,

    #[error("session not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid session time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate a session's time window.
pub fn validate_session(session: &Session, now: DateTime<Utc>) -> Result<(), AuthError> {
    if session.expires_at <= session.issued_at {
        return Err(AuthError::InvalidTimeWindow);
    }
    if now < session.issued_at {
        return Err(AuthError::NotYetValid);
    }
    if now >= session.expires_at {
        return Err(AuthError::Expired);
    }
    Ok(())
}

/// In-memory sessions. Everyone is logged out when the process restarts.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, email: &str, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: SessionToken::generate(),
            email: email.trim().to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
        };
        // Abandoned logins are never presented again; sweep them here.
        let purged = self.purge_expired(now);
        self.write().insert(session.token, session.clone());

        tracing::debug!(email = %session.email, purged, "session issued");
        session
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub fn validate(&self, token: SessionToken, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let session = self
            .read()
            .get(&token)
            .cloned()
            .ok_or(AuthError::UnknownSession)?;

        if let Err(e) = validate_session(&session, now) {
            if e == AuthError::Expired {
                self.write().remove(&token);
            }
            return Err(e);
        }
        Ok(session)
    }

    pub fn revoke(&self, token: SessionToken) -> bool {
        self.write().remove(&token).is_some()
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| now < s.expires_at);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SessionToken, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<SessionToken, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::hours(1))
    }

    #[test]
    fn issued_session_validates_until_expiry() {
        let store = store();
        let now = Utc::now();
        let s = store.issue("finance@club.example", now);

        assert_eq!(store.validate(s.token, now).unwrap().email, "finance@club.example");
        assert_eq!(
            store.validate(s.token, now + Duration::hours(1)),
            Err(AuthError::Expired)
        );
        // Expired sessions are removed.
        assert_eq!(
            store.validate(s.token, now),
            Err(AuthError::UnknownSession)
        );
    }

    #[test]
    fn revoked_session_is_unknown() {
        let store = store();
        let now = Utc::now();
        let s = store.issue("a@b.c", now);
        assert!(store.revoke(s.token));
        assert!(!store.revoke(s.token));
        assert_eq!(store.validate(s.token, now), Err(AuthError::UnknownSession));
    }

    #[test]
    fn token_parses_from_cookie_value() {
        let t = SessionToken::generate();
        let parsed: SessionToken = t.to_string().parse().unwrap();
        assert_eq!(parsed, t);
        assert_eq!("nope".parse::<SessionToken>(), Err(AuthError::MalformedToken));
    }

    #[test]
    fn time_window_checks() {
        let now = Utc::now();
        let mut s = Session {
            token: SessionToken::generate(),
            email: String::new(),
            issued_at: now,
            expires_at: now,
        };
        assert_eq!(validate_session(&s, now), Err(AuthError::InvalidTimeWindow));
        s.expires_at = now + Duration::minutes(5);
        assert_eq!(
            validate_session(&s, now - Duration::minutes(1)),
            Err(AuthError::NotYetValid)
        );
        assert_eq!(validate_session(&s, now), Ok(()));
    }

    #[test]
    fn issuing_sweeps_abandoned_sessions() {
        let store = store();
        let now = Utc::now();
        let abandoned = store.issue("old@b.c", now - Duration::hours(2));
        assert_eq!(store.len(), 1);

        let fresh = store.issue("new@b.c", now);

        assert_eq!(store.len(), 1);
        assert_eq!(store.validate(abandoned.token, now), Err(AuthError::UnknownSession));
        assert!(store.validate(fresh.token, now).is_ok());
    }

    #[test]
    fn purge_removes_only_expired() {
        let store = store();
        let now = Utc::now();
        store.issue("early@b.c", now - Duration::minutes(30));
        store.issue("late@b.c", now);
        assert_eq!(store.purge_expired(now + Duration::minutes(45)), 1);
        assert_eq!(store.len(), 1);
    }
}
