//! Flat field-name/value payload, as posted by the purchase-request page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use purchreq_core::{DomainError, FormSlot, ItemIndex, Money};
use purchreq_events::execute;

use crate::control::{ControlId, FieldKind, parse_quantity};
use crate::currency::Currency;
use crate::line_item::FileRef;
use crate::state::{AmountField, FormCommand, FormState};

/// Older pages post FOREIGN taxes under this name instead of `hst_gst_amount`.
const FOREIGN_TAX_FIELD: &str = "usd_taxes";

/// A file part of the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn file_ref(&self) -> FileRef {
        FileRef::new(self.filename.clone(), self.bytes.len() as u64)
    }
}

/// Field-name/value pairs plus attached files keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPayload {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub files: BTreeMap<String, UploadedFile>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn insert_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.insert(name.into(), file);
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A file input counts as attached only when it carries a filename.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .get(name)
            .filter(|f| !f.filename.trim().is_empty())
    }

    fn control(&self, id: ControlId) -> Option<&str> {
        self.field(&id.name())
    }
}

impl FormState {
    /// Rebuild form state from a posted payload.
    ///
    /// Item rows are read in order until the first row without a name, at most
    /// fifteen per slot. Proof of payment is only read for FOREIGN slots.
    pub fn from_payload(payload: &FormPayload) -> Result<FormState, DomainError> {
        let mut state = FormState::default();
        for slot in FormSlot::all() {
            for cmd in slot_commands(payload, slot)? {
                execute(&mut state, &cmd)?;
            }
        }
        Ok(state)
    }

    /// Flatten the state back into field-name/value pairs.
    ///
    /// File entries carry metadata only.
    pub fn to_payload(&self) -> FormPayload {
        let mut payload = FormPayload::new();

        for form in self.forms() {
            let slot = form.slot;
            let put = |p: &mut FormPayload, kind: FieldKind, value: String| {
                p.insert_field(ControlId::form(kind, slot).name(), value);
            };

            let breakdown = form.breakdown();
            put(&mut payload, FieldKind::VendorName, form.vendor_name.clone());
            put(&mut payload, FieldKind::Currency, form.currency.code().to_string());
            put(&mut payload, FieldKind::Discount, form.discount.to_string());
            put(&mut payload, FieldKind::Tax, form.tax.to_string());
            put(&mut payload, FieldKind::Shipping, form.shipping.to_string());
            put(&mut payload, FieldKind::ForeignTotal, form.foreign_total.to_string());
            put(&mut payload, FieldKind::HomeAmountPaid, form.home_amount_paid.to_string());
            put(&mut payload, FieldKind::Subtotal, breakdown.subtotal.to_string());
            put(&mut payload, FieldKind::Total, breakdown.total.to_string());

            for (kind, file) in [
                (FieldKind::InvoiceFile, &form.invoice_file),
                (FieldKind::ProofOfPayment, &form.proof_of_payment),
            ] {
                if let Some(file) = file {
                    payload.insert_file(
                        ControlId::form(kind, slot).name(),
                        UploadedFile {
                            filename: file.filename.clone(),
                            content_type: None,
                            bytes: Vec::new(),
                        },
                    );
                }
            }

            for (pos, item) in form.items.iter().enumerate() {
                let Ok(row) = ItemIndex::new(pos as u8 + 1) else {
                    break;
                };
                let name = |kind| ControlId::item(kind, slot, row).name();
                payload.insert_field(name(FieldKind::ItemName), item.name.clone());
                payload.insert_field(name(FieldKind::ItemUsage), item.usage.clone());
                payload.insert_field(name(FieldKind::ItemQuantity), item.quantity.to_string());
                payload.insert_field(name(FieldKind::ItemPrice), item.unit_price.to_string());
                payload.insert_field(name(FieldKind::ItemTotal), item.total().to_string());
            }
        }

        payload
    }
}

fn slot_commands(payload: &FormPayload, slot: FormSlot) -> Result<Vec<FormCommand>, DomainError> {
    let mut cmds = Vec::new();
    let form_field = move |kind| payload.control(ControlId::form(kind, slot));

    if let Some(vendor) = form_field(FieldKind::VendorName) {
        cmds.push(FormCommand::SetVendor {
            slot,
            vendor_name: vendor.to_string(),
        });
    }

    let currency = form_field(FieldKind::Currency)
        .map(Currency::from_code)
        .unwrap_or_default();
    cmds.push(FormCommand::SelectCurrency { slot, currency });

    if let Some(file) = payload.file(&ControlId::form(FieldKind::InvoiceFile, slot).name()) {
        cmds.push(FormCommand::AttachInvoice {
            slot,
            file: Some(file.file_ref()),
        });
    }
    if currency == Currency::Foreign {
        if let Some(file) = payload.file(&ControlId::form(FieldKind::ProofOfPayment, slot).name())
        {
            cmds.push(FormCommand::AttachProofOfPayment {
                slot,
                file: Some(file.file_ref()),
            });
        }
    }

    for (kind, field) in [
        (FieldKind::Discount, AmountField::Discount),
        (FieldKind::Tax, AmountField::Tax),
        (FieldKind::Shipping, AmountField::Shipping),
        (FieldKind::ForeignTotal, AmountField::ForeignTotal),
        (FieldKind::HomeAmountPaid, AmountField::HomeAmountPaid),
    ] {
        let raw = form_field(kind).or_else(|| {
            (kind == FieldKind::Tax && currency == Currency::Foreign)
                .then(|| payload.field(&format!("{FOREIGN_TAX_FIELD}_{slot}")))
                .flatten()
        });
        if let Some(raw) = raw {
            cmds.push(FormCommand::SetAmount {
                slot,
                field,
                amount: Money::parse_lenient(raw)?,
            });
        }
    }

    for n in 1..=ItemIndex::MAX {
        let row = ItemIndex::new(n)?;
        let item_field = move |kind| payload.control(ControlId::item(kind, slot, row));

        let Some(name) = item_field(FieldKind::ItemName).filter(|v| !v.trim().is_empty()) else {
            break;
        };
        if n > 1 {
            cmds.push(FormCommand::AddLineItem { slot });
        }
        cmds.push(FormCommand::EditItemName {
            slot,
            row,
            name: name.to_string(),
        });
        cmds.push(FormCommand::EditItemUsage {
            slot,
            row,
            usage: item_field(FieldKind::ItemUsage).unwrap_or_default().to_string(),
        });
        cmds.push(FormCommand::EditQuantity {
            slot,
            row,
            quantity: parse_quantity(item_field(FieldKind::ItemQuantity).unwrap_or_default())?,
        });
        cmds.push(FormCommand::EditUnitPrice {
            slot,
            row,
            price: Money::parse_lenient(item_field(FieldKind::ItemPrice).unwrap_or_default())?,
        });
    }

    Ok(cmds)
}
