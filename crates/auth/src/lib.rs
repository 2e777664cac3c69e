//! `purchreq-auth`: shared-credential login and session tracking.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod credentials;
pub mod session;

pub use credentials::Credentials;
pub use session::{AuthError, Session, SessionStore, SessionToken, validate_session};
