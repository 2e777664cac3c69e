use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

pub mod auth;
pub mod forms;
pub mod submissions;
pub mod system;

/// Uploads for ten forms (invoice and proof of payment each) fit comfortably.
const MAX_SUBMISSION_BYTES: usize = 64 * 1024 * 1024;

/// Router for all endpoints that require a logged-in session.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/dashboard", get(system::dashboard))
        .route("/forms/preview", post(forms::preview))
        .route(
            "/submit-all-requests",
            post(submissions::submit_all_requests)
                .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
        )
}

/// Router for endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
}
