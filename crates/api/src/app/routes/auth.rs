use std::sync::Arc;

use axum::{
    Form,
    extract::Extension,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect},
};
use chrono::Utc;

use crate::app::{dto, errors, services::AppServices};
use crate::middleware::{expired_session_cookie, session_cookie, session_token};

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Form(body): Form<dto::LoginRequest>,
) -> axum::response::Response {
    if !services.credentials.verify(&body.email, &body.password) {
        tracing::warn!(email = %body.email.trim(), "failed login attempt");
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid email or password",
        );
    }

    let session = services.sessions.issue(&body.email, Utc::now());
    tracing::info!(email = %session.email, "login");

    (
        [(header::SET_COOKIE, session_cookie(session.token, services.sessions.ttl()))],
        Redirect::to("/dashboard"),
    )
        .into_response()
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> axum::response::Response {
    if let Some(token) = session_token(&headers) {
        if services.sessions.revoke(token) {
            tracing::info!("logout");
        }
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}
