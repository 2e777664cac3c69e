//! The one-row-per-submission log the finance team reviews.

use chrono::NaiveDateTime;
use serde::Serialize;

use purchreq_forms::AcceptedBatch;

use crate::submitter::Submitter;

/// Timestamp, Name, Email, Address, E-transfer Email, Team, Total Amount, Folder Link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FinanceLogRow(pub [String; 8]);

pub fn finance_log_row(
    submitter: &Submitter,
    batch: &AcceptedBatch,
    at: NaiveDateTime,
    folder_link: &str,
) -> FinanceLogRow {
    FinanceLogRow([
        at.format("%Y-%m-%d %H:%M:%S").to_string(),
        submitter.name.clone(),
        submitter.email.clone(),
        submitter.address.clone(),
        submitter.e_transfer_email.clone(),
        submitter.team.clone(),
        format!("${}", batch.home_currency_total()),
        folder_link.to_string(),
    ])
}
