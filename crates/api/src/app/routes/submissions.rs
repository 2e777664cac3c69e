use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Local;

use purchreq_core::AggregateRoot;
use purchreq_forms::{
    AcceptedBatch, ControlId, FieldKind, FormPayload, FormState, UploadedFile, check_submission,
};
use purchreq_reports::{Submitter, expense_report, finance_log_row, purchase_request};

use crate::app::{dto, errors, services::AppServices};
use crate::archive::{
    ArchivedFile, SessionArchive, invoice_file_name, proof_of_payment_file_name,
    session_folder_name,
};
use crate::context::SessionContext;

/// Submit every invoice form of the page in one multipart request.
pub async fn submit_all_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    multipart: Multipart,
) -> axum::response::Response {
    let payload = match read_payload(multipart).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let state = match FormState::from_payload(&payload) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let batch = match check_submission(&state) {
        Ok(b) => b,
        Err(e) => {
            tracing::info!(by = %session.email(), code = e.code(), "submission blocked");
            return errors::submission_error_to_response(e);
        }
    };

    let submission_id = *state.id();
    let submitter = Submitter::from_payload(&payload);
    let now = Local::now().naive_local();
    let today = now.date();

    let folder_name = session_folder_name(&submitter, now);
    let folder_link = services.archive.folder_link(&folder_name);

    let archive = SessionArchive {
        submission_id,
        folder_name,
        files: archived_files(&payload, &batch),
        purchase_request: purchase_request(&submitter, &batch, today),
        expense_report: expense_report(&submitter, &batch, today),
        log_row: finance_log_row(&submitter, &batch, now, &folder_link),
    };

    let sink = services.archive.clone();
    let archived = match tokio::task::spawn_blocking(move || sink.store(&archive)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::error!(%submission_id, "failed to archive submission: {e}");
            services.alert(
                "submission not archived",
                format!(
                    "Submission {submission_id} by {} was accepted but not archived: {e}",
                    session.email()
                ),
            );
            false
        }
        Err(e) => {
            tracing::error!(%submission_id, "archive task failed: {e}");
            services.alert(
                "submission not archived",
                format!(
                    "Submission {submission_id} by {}: archive task failed: {e}",
                    session.email()
                ),
            );
            false
        }
    };

    tracing::info!(
        %submission_id,
        by = %session.email(),
        forms = batch.invoices.len(),
        total = %batch.home_currency_total(),
        "submission accepted"
    );

    (
        StatusCode::CREATED,
        Json(dto::SubmissionResponse::new(submission_id, &batch, folder_link, archived)),
    )
        .into_response()
}

async fn read_payload(mut multipart: Multipart) -> Result<FormPayload, axum::response::Response> {
    let mut payload = FormPayload::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                payload.insert_file(
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let value = field.text().await.map_err(bad_multipart)?;
                payload.insert_field(name, value);
            }
        }
    }

    Ok(payload)
}

fn bad_multipart(err: MultipartError) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_multipart", err.to_string())
}

/// Uploads of the accepted forms, renamed for the session folder.
fn archived_files(payload: &FormPayload, batch: &AcceptedBatch) -> Vec<ArchivedFile> {
    let bytes = |kind, slot| {
        payload
            .file(&ControlId::form(kind, slot).name())
            .map(|f| f.bytes.clone())
            .unwrap_or_default()
    };

    let mut files = Vec::new();
    for invoice in &batch.invoices {
        files.push(ArchivedFile {
            name: invoice_file_name(
                invoice.slot,
                &invoice.vendor_name,
                invoice.invoice_file.extension(),
            ),
            bytes: bytes(FieldKind::InvoiceFile, invoice.slot),
        });
        if let Some(proof) = &invoice.proof_of_payment {
            files.push(ArchivedFile {
                name: proof_of_payment_file_name(invoice.slot, proof.extension()),
                bytes: bytes(FieldKind::ProofOfPayment, invoice.slot),
            });
        }
    }
    files
}
