//! Submission Gatekeeper: the last check before a batch leaves the client.

use serde::Serialize;
use thiserror::Error;

use purchreq_core::{FormSlot, Money};

use crate::currency::Currency;
use crate::invoice::{FinancialBreakdown, InvoiceForm};
use crate::line_item::{FileRef, LineItem};
use crate::state::FormState;

pub const NO_COMPLETE_INVOICE_MESSAGE: &str = "Please complete at least one invoice form before submitting. \
Make sure to fill in the vendor name, upload an invoice file, and add at least one item.";

/// Why a batch was blocked. Every variant is fixed by editing the form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Form {0}: please attach the invoice file before submitting.")]
    MissingInvoice(FormSlot),

    #[error("Form {0}: proof of payment is required for USD purchases.")]
    MissingProofOfPayment(FormSlot),

    #[error("{}", NO_COMPLETE_INVOICE_MESSAGE)]
    NoCompleteInvoice,
}

impl SubmissionError {
    /// The slot the message refers to, if any.
    pub fn slot(&self) -> Option<FormSlot> {
        match self {
            SubmissionError::MissingInvoice(slot)
            | SubmissionError::MissingProofOfPayment(slot) => Some(*slot),
            SubmissionError::NoCompleteInvoice => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SubmissionError::MissingInvoice(_) => "missing_invoice",
            SubmissionError::MissingProofOfPayment(_) => "missing_proof_of_payment",
            SubmissionError::NoCompleteInvoice => "no_complete_invoice",
        }
    }
}

/// A form that passed the gatekeeper, with only its complete rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedInvoice {
    pub slot: FormSlot,
    pub currency: Currency,
    pub vendor_name: String,
    pub invoice_file: FileRef,
    pub proof_of_payment: Option<FileRef>,
    pub items: Vec<LineItem>,
    /// Computed over every row the user saw, matching the on-screen totals.
    pub breakdown: FinancialBreakdown,
    pub foreign_total: Money,
    pub home_amount_paid: Money,
    pub conversion_rate: f64,
}

impl AcceptedInvoice {
    fn from_form(form: &InvoiceForm, invoice_file: &FileRef) -> Self {
        Self {
            slot: form.slot,
            currency: form.currency,
            vendor_name: form.vendor_name.trim().to_string(),
            invoice_file: invoice_file.clone(),
            proof_of_payment: form.proof_of_payment.clone(),
            items: form.complete_items().cloned().collect(),
            breakdown: form.breakdown(),
            foreign_total: form.foreign_total,
            home_amount_paid: form.home_amount_paid,
            conversion_rate: form.conversion_rate(),
        }
    }

    /// Amount reimbursed in the home currency.
    pub fn home_currency_amount(&self) -> Money {
        match self.currency {
            Currency::Home => self.breakdown.total,
            Currency::Foreign => self.home_amount_paid,
        }
    }
}

/// The qualifying forms of a batch, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedBatch {
    pub invoices: Vec<AcceptedInvoice>,
}

impl AcceptedBatch {
    pub fn home_currency_total(&self) -> Money {
        self.invoices
            .iter()
            .map(AcceptedInvoice::home_currency_amount)
            .sum()
    }

    pub fn slots(&self) -> Vec<FormSlot> {
        self.invoices.iter().map(|i| i.slot).collect()
    }
}

/// Decide whether a batch may be submitted.
///
/// Slots with a blank vendor are skipped. A named slot without its invoice
/// file, or a FOREIGN slot without proof of payment, blocks the whole batch.
/// A named slot with files but no complete row does not qualify. At least one
/// slot must qualify.
pub fn check_submission(state: &FormState) -> Result<AcceptedBatch, SubmissionError> {
    let mut invoices = Vec::new();

    for form in state.forms() {
        if form.is_blank() {
            continue;
        }

        let Some(invoice_file) = form.invoice_file.as_ref() else {
            tracing::debug!(slot = %form.slot, "submission blocked: missing invoice file");
            return Err(SubmissionError::MissingInvoice(form.slot));
        };

        if form.currency == Currency::Foreign && form.proof_of_payment.is_none() {
            tracing::debug!(slot = %form.slot, "submission blocked: missing proof of payment");
            return Err(SubmissionError::MissingProofOfPayment(form.slot));
        }

        if form.has_complete_item() {
            invoices.push(AcceptedInvoice::from_form(form, invoice_file));
        } else {
            tracing::debug!(slot = %form.slot, "form has no complete item; not counted");
        }
    }

    if invoices.is_empty() {
        return Err(SubmissionError::NoCompleteInvoice);
    }

    Ok(AcceptedBatch { invoices })
}
