//! Purchase-request form domain.
//!
//! Up to ten invoice sub-forms per batch, each holding 1..=15 line items. This
//! crate tracks their state, derives currency-dependent field presentation and
//! decides whether a batch may be submitted. Everything here is deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod control;
pub mod currency;
pub mod gatekeeper;
pub mod invoice;
pub mod line_item;
pub mod payload;
pub mod presentation;
pub mod state;

pub use control::{ControlId, FieldKind, FormController, InputEvent, ViewUpdate};
pub use currency::Currency;
pub use gatekeeper::{AcceptedBatch, AcceptedInvoice, SubmissionError, check_submission};
pub use invoice::{FinancialBreakdown, InvoiceForm};
pub use line_item::{FileRef, LineItem};
pub use payload::{FormPayload, UploadedFile};
pub use presentation::FieldPresentation;
pub use state::{FormCommand, FormEvent, FormState};
