use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use purchreq_auth::{SessionStore, SessionToken};

use crate::app::errors::json_error;
use crate::context::SessionContext;

pub const SESSION_COOKIE: &str = "purchreq_session";

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionStore>,
}

pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = || json_error(StatusCode::UNAUTHORIZED, "unauthorized", "login required");

    let token = session_token(req.headers()).ok_or_else(unauthorized)?;

    let session = state.sessions.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!("session rejected: {e}");
        unauthorized()
    })?;

    req.extensions_mut().insert(SessionContext::new(&session));

    Ok(next.run(req).await)
}

/// Session token from the `Cookie` header, if one is present and well formed.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// `Set-Cookie` value carrying a fresh session.
pub fn session_cookie(token: SessionToken, max_age: chrono::Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.num_seconds()
    )
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn token_is_read_among_other_cookies() {
        let token = SessionToken::generate();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}; x=1")).unwrap(),
        );
        assert_eq!(session_token(&headers), Some(token));
    }

    #[test]
    fn missing_or_garbled_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("purchreq_session=garbage"),
        );
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookies_are_http_only() {
        let c = session_cookie(SessionToken::generate(), chrono::Duration::hours(1));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("SameSite=Lax"));
        assert!(c.ends_with("Max-Age=3600"));
        assert!(expired_session_cookie().ends_with("Max-Age=0"));
    }
}
