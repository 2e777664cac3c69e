//! Expense report: one summary row per accepted invoice.

use chrono::{Datelike, NaiveDate};

use purchreq_core::Money;
use purchreq_forms::{AcceptedBatch, AcceptedInvoice, Currency};

use crate::cell::{Sheet, Workbook};
use crate::submitter::Submitter;

pub const TEMPLATE: &str = "expense_report_template.xlsx";

const SHEET: &str = "Expense Report";
const FIRST_ROW: usize = 6;

/// `July4-2026-ExpenseReport-JamieDoe.xlsx`.
pub fn expense_report_file_name(submitter: &Submitter, today: NaiveDate) -> String {
    format!(
        "{}{}-{}-ExpenseReport-{}.xlsx",
        today.format("%B"),
        today.day(),
        today.year(),
        submitter.pascal_name()
    )
}

/// HOME invoices are listed first, then FOREIGN ones, each in slot order.
pub fn expense_report(submitter: &Submitter, batch: &AcceptedBatch, today: NaiveDate) -> Workbook {
    let date = today.format("%Y-%m-%d").to_string();
    let mut ws = Sheet::new(SHEET);

    ws.set("C2", submitter.name.as_str());
    ws.set("F2", date.as_str());
    ws.set("C3", submitter.email.as_str());
    ws.set("F3", submitter.address.as_str());

    let home = batch.invoices.iter().filter(|i| i.currency == Currency::Home);
    let foreign = batch
        .invoices
        .iter()
        .filter(|i| i.currency == Currency::Foreign);

    for (offset, invoice) in home.chain(foreign).enumerate() {
        let row = FIRST_ROW + offset;
        ws.set(format!("B{row}"), date.as_str());
        ws.set(format!("C{row}"), invoice.vendor_name.as_str());
        match invoice.currency {
            Currency::Home => {
                ws.set(format!("F{row}"), invoice.breakdown.subtotal);
                ws.set(format!("G{row}"), invoice.breakdown.total);
                ws.set(format!("H{row}"), invoice.breakdown.tax);
            }
            Currency::Foreign => {
                ws.set(format!("D{row}"), invoice.foreign_total);
                ws.set(format!("E{row}"), exchange_rate(invoice));
                ws.set(format!("F{row}"), invoice.home_amount_paid);
                ws.set(format!("G{row}"), invoice.home_amount_paid);
                ws.set(format!("H{row}"), Money::ZERO);
            }
        }
    }

    Workbook {
        template: TEMPLATE,
        file_name: expense_report_file_name(submitter, today),
        sheets: vec![ws],
    }
}

/// Home amount paid over the invoice's foreign total; 0 when either is missing.
fn exchange_rate(invoice: &AcceptedInvoice) -> f64 {
    if invoice.foreign_total.is_positive() && invoice.home_amount_paid.is_positive() {
        invoice.home_amount_paid.as_f64() / invoice.foreign_total.as_f64()
    } else {
        tracing::warn!(
            slot = %invoice.slot,
            vendor = %invoice.vendor_name,
            "cannot compute exchange rate: foreign total or amount paid missing"
        );
        0.0
    }
}
