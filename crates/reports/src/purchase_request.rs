//! Purchase-request workbook: one `Receipt{slot}` tab per accepted invoice.

use chrono::NaiveDate;

use purchreq_core::ItemIndex;
use purchreq_forms::{AcceptedBatch, AcceptedInvoice, Currency};

use crate::cell::{Sheet, Workbook};
use crate::submitter::Submitter;

pub const TEMPLATE: &str = "purchase_request_template.xlsx";
pub const FILE_NAME: &str = "purchase_request.xlsx";

/// First row of the item table on each receipt tab.
const FIRST_ITEM_ROW: usize = 9;

pub fn purchase_request(submitter: &Submitter, batch: &AcceptedBatch, today: NaiveDate) -> Workbook {
    let sheets = batch
        .invoices
        .iter()
        .map(|invoice| receipt_sheet(submitter, invoice, today))
        .collect();

    Workbook {
        template: TEMPLATE,
        file_name: FILE_NAME.to_string(),
        sheets,
    }
}

fn receipt_sheet(submitter: &Submitter, invoice: &AcceptedInvoice, today: NaiveDate) -> Sheet {
    let mut ws = Sheet::new(format!("Receipt{}", invoice.slot));

    ws.set("B1", today.format("%Y-%m-%d").to_string());
    ws.set("D1", invoice.currency.code());
    ws.set("B3", submitter.name.as_str());
    ws.set("D3", submitter.e_transfer_email.as_str());
    ws.set("B4", submitter.team.as_str());
    ws.set("B7", invoice.vendor_name.as_str());
    ws.set("B32", submitter.address.as_str());

    for (i, item) in invoice
        .items
        .iter()
        .take(usize::from(ItemIndex::MAX))
        .enumerate()
    {
        let row = FIRST_ITEM_ROW + i;
        ws.set(format!("B{row}"), item.name.as_str());
        ws.set(format!("C{row}"), item.usage.as_str());
        ws.set(format!("D{row}"), item.quantity);
        ws.set(format!("E{row}"), item.unit_price);
        ws.set(format!("F{row}"), item.total());
    }

    let tax_label = match invoice.currency {
        Currency::Home => "HST/GST",
        Currency::Foreign => "Taxes",
    };
    ws.set("E25", tax_label);
    ws.set("F25", invoice.breakdown.tax);
    ws.set("F26", invoice.breakdown.shipping);
    ws.set("F27", invoice.home_currency_amount());

    if invoice.currency == Currency::Foreign {
        ws.set("C7", "Conversion Rate");
        ws.set("D7", invoice.conversion_rate);
    }

    tracing::debug!(
        sheet = %ws.name,
        items = invoice.items.len(),
        "filled purchase request tab"
    );
    ws
}
