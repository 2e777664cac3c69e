use axum::{Json, response::IntoResponse};

use purchreq_forms::{FormPayload, FormState, check_submission};

use crate::app::{dto, errors};

/// Recompute every slot from a posted payload without submitting anything.
pub async fn preview(Json(payload): Json<FormPayload>) -> axum::response::Response {
    let state = match FormState::from_payload(&payload) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let blocked = check_submission(&state).err();
    let body = dto::PreviewResponse {
        forms: state.forms().map(dto::FormPreviewResponse::from_form).collect(),
        submittable: blocked.is_none(),
        blocked: blocked.as_ref().map(dto::BlockedResponse::from),
    };

    Json(body).into_response()
}
