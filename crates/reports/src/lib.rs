//! Finance-team artifacts for an accepted submission.
//!
//! Each artifact is a list of cell writes against a known spreadsheet
//! template. Rendering the template itself is the archive's business; this
//! crate only decides *what* goes *where*.

pub mod cell;
pub mod expense_report;
pub mod finance_log;
pub mod purchase_request;
pub mod submitter;

pub use cell::{CellValue, Sheet, Workbook};
pub use expense_report::{expense_report, expense_report_file_name};
pub use finance_log::{FinanceLogRow, finance_log_row};
pub use purchase_request::purchase_request;
pub use submitter::Submitter;
