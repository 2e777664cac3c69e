use serde::{Deserialize, Serialize};

use purchreq_core::{ItemIndex, SubmissionId};
use purchreq_forms::{
    AcceptedBatch, Currency, FieldPresentation, FinancialBreakdown, InvoiceForm, SubmissionError,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

/// Money figures are rendered as `"x.yy"` strings, the way the page shows them.
#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub subtotal: String,
    pub discount: String,
    pub tax: String,
    pub shipping: String,
    pub total: String,
}

impl From<FinancialBreakdown> for BreakdownResponse {
    fn from(b: FinancialBreakdown) -> Self {
        Self {
            subtotal: b.subtotal.to_string(),
            discount: b.discount.to_string(),
            tax: b.tax.to_string(),
            shipping: b.shipping.to_string(),
            total: b.total.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormPreviewResponse {
    pub slot: u8,
    pub currency: &'static str,
    pub item_count: usize,
    pub can_add_item: bool,
    pub can_remove_item: bool,
    pub row_totals: Vec<String>,
    pub breakdown: BreakdownResponse,
    pub presentation: FieldPresentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_rate: Option<f64>,
}

impl FormPreviewResponse {
    pub fn from_form(form: &InvoiceForm) -> Self {
        let count = form.item_count();
        Self {
            slot: form.slot.get(),
            currency: form.currency.code(),
            item_count: count,
            can_add_item: count < usize::from(ItemIndex::MAX),
            can_remove_item: count > 1,
            row_totals: form.items.iter().map(|i| i.total().to_string()).collect(),
            breakdown: form.breakdown().into(),
            presentation: FieldPresentation::derive(form),
            conversion_rate: (form.currency == Currency::Foreign).then(|| form.conversion_rate()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockedResponse {
    pub error: &'static str,
    pub message: String,
    pub slot: Option<u8>,
}

impl From<&SubmissionError> for BlockedResponse {
    fn from(err: &SubmissionError) -> Self {
        Self {
            error: err.code(),
            message: err.to_string(),
            slot: err.slot().map(|s| s.get()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub forms: Vec<FormPreviewResponse>,
    pub submittable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<BlockedResponse>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: SubmissionId,
    pub slots: Vec<u8>,
    pub total: String,
    pub folder: String,
    pub archived: bool,
}

impl SubmissionResponse {
    pub fn new(id: SubmissionId, batch: &AcceptedBatch, folder: String, archived: bool) -> Self {
        Self {
            submission_id: id,
            slots: batch.slots().into_iter().map(|s| s.get()).collect(),
            total: batch.home_currency_total().to_string(),
            folder,
            archived,
        }
    }
}
