use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use purchreq_core::DomainError;
use purchreq_forms::SubmissionError;

use crate::app::dto::BlockedResponse;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match &err {
        DomainError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.user_message())
        }
        DomainError::InvariantViolation(_) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invariant_violation",
            err.user_message(),
        ),
        DomainError::InvalidId(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", err.user_message())
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", err.user_message()),
    }
}

/// Blocked submissions carry the offending slot so the page can focus it.
pub fn submission_error_to_response(err: SubmissionError) -> axum::response::Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        axum::Json(BlockedResponse::from(&err)),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
