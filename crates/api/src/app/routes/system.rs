use axum::{Json, extract::Extension, response::IntoResponse};
use chrono::Utc;

use purchreq_core::{FormSlot, ItemIndex};

use crate::context::SessionContext;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "email": session.email(),
        "expires_at": session.expires_at().to_rfc3339(),
    }))
}

/// Landing page after login: who is signed in and the form limits.
pub async fn dashboard(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "email": session.email(),
        "max_forms": FormSlot::MAX,
        "max_items_per_form": ItemIndex::MAX,
    }))
}
