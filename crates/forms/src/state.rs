//! Form State Tracker: the per-batch aggregate holding all ten invoice forms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use purchreq_core::{
    Aggregate, AggregateRoot, DomainError, FormSlot, ItemIndex, Money, SubmissionId,
};
use purchreq_events::{Command, Event};

use crate::currency::Currency;
use crate::invoice::InvoiceForm;
use crate::line_item::{FileRef, LineItem};

/// Per-form money inputs entered directly by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountField {
    Discount,
    Tax,
    Shipping,
    ForeignTotal,
    HomeAmountPaid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormCommand {
    AddLineItem { slot: FormSlot },
    RemoveLineItem { slot: FormSlot, row: ItemIndex },
    EditItemName { slot: FormSlot, row: ItemIndex, name: String },
    EditItemUsage { slot: FormSlot, row: ItemIndex, usage: String },
    EditQuantity { slot: FormSlot, row: ItemIndex, quantity: u32 },
    EditUnitPrice { slot: FormSlot, row: ItemIndex, price: Money },
    SelectCurrency { slot: FormSlot, currency: Currency },
    SetVendor { slot: FormSlot, vendor_name: String },
    /// `None` clears the file input.
    AttachInvoice { slot: FormSlot, file: Option<FileRef> },
    AttachProofOfPayment { slot: FormSlot, file: Option<FileRef> },
    SetAmount { slot: FormSlot, field: AmountField, amount: Money },
}

impl Command for FormCommand {
    fn target_slot(&self) -> FormSlot {
        match self {
            FormCommand::AddLineItem { slot }
            | FormCommand::RemoveLineItem { slot, .. }
            | FormCommand::EditItemName { slot, .. }
            | FormCommand::EditItemUsage { slot, .. }
            | FormCommand::EditQuantity { slot, .. }
            | FormCommand::EditUnitPrice { slot, .. }
            | FormCommand::SelectCurrency { slot, .. }
            | FormCommand::SetVendor { slot, .. }
            | FormCommand::AttachInvoice { slot, .. }
            | FormCommand::AttachProofOfPayment { slot, .. }
            | FormCommand::SetAmount { slot, .. } => *slot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormEvent {
    LineItemAdded { slot: FormSlot, row: ItemIndex },
    LineItemRemoved { slot: FormSlot, row: ItemIndex },
    ItemNameChanged { slot: FormSlot, row: ItemIndex, name: String },
    ItemUsageChanged { slot: FormSlot, row: ItemIndex, usage: String },
    QuantityChanged { slot: FormSlot, row: ItemIndex, quantity: u32 },
    UnitPriceChanged { slot: FormSlot, row: ItemIndex, price: Money },
    CurrencySelected { slot: FormSlot, currency: Currency },
    ProofOfPaymentCleared { slot: FormSlot },
    VendorChanged { slot: FormSlot, vendor_name: String },
    InvoiceFileChanged { slot: FormSlot, file: Option<FileRef> },
    ProofOfPaymentChanged { slot: FormSlot, file: Option<FileRef> },
    AmountChanged { slot: FormSlot, field: AmountField, amount: Money },
}

impl FormEvent {
    pub fn slot(&self) -> FormSlot {
        match self {
            FormEvent::LineItemAdded { slot, .. }
            | FormEvent::LineItemRemoved { slot, .. }
            | FormEvent::ItemNameChanged { slot, .. }
            | FormEvent::ItemUsageChanged { slot, .. }
            | FormEvent::QuantityChanged { slot, .. }
            | FormEvent::UnitPriceChanged { slot, .. }
            | FormEvent::CurrencySelected { slot, .. }
            | FormEvent::ProofOfPaymentCleared { slot }
            | FormEvent::VendorChanged { slot, .. }
            | FormEvent::InvoiceFileChanged { slot, .. }
            | FormEvent::ProofOfPaymentChanged { slot, .. }
            | FormEvent::AmountChanged { slot, .. } => *slot,
        }
    }

    /// Whether the event can change the slot's subtotal.
    pub fn affects_subtotal(&self) -> bool {
        matches!(
            self,
            FormEvent::LineItemAdded { .. }
                | FormEvent::LineItemRemoved { .. }
                | FormEvent::QuantityChanged { .. }
                | FormEvent::UnitPriceChanged { .. }
        )
    }
}

impl Event for FormEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FormEvent::LineItemAdded { .. } => "forms.item.added",
            FormEvent::LineItemRemoved { .. } => "forms.item.removed",
            FormEvent::ItemNameChanged { .. } => "forms.item.name_changed",
            FormEvent::ItemUsageChanged { .. } => "forms.item.usage_changed",
            FormEvent::QuantityChanged { .. } => "forms.item.quantity_changed",
            FormEvent::UnitPriceChanged { .. } => "forms.item.price_changed",
            FormEvent::CurrencySelected { .. } => "forms.invoice.currency_selected",
            FormEvent::ProofOfPaymentCleared { .. } => "forms.invoice.proof_cleared",
            FormEvent::VendorChanged { .. } => "forms.invoice.vendor_changed",
            FormEvent::InvoiceFileChanged { .. } => "forms.invoice.file_changed",
            FormEvent::ProofOfPaymentChanged { .. } => "forms.invoice.proof_changed",
            FormEvent::AmountChanged { .. } => "forms.invoice.amount_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

/// Aggregate root: every invoice form of one submission batch.
///
/// All ten slots exist from the start; an unused slot is simply one whose
/// vendor name is blank. A slot's item count is the length of its item
/// vector, so the slot → count map is [`FormState::item_counts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    id: SubmissionId,
    forms: BTreeMap<FormSlot, InvoiceForm>,
    version: u64,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(SubmissionId::new())
    }
}

impl FormState {
    pub fn new(id: SubmissionId) -> Self {
        let forms = FormSlot::all().map(|s| (s, InvoiceForm::new(s))).collect();
        Self {
            id,
            forms,
            version: 0,
        }
    }

    pub fn form(&self, slot: FormSlot) -> &InvoiceForm {
        // Every slot is populated in `new` and never removed.
        &self.forms[&slot]
    }

    pub fn forms(&self) -> impl Iterator<Item = &InvoiceForm> {
        self.forms.values()
    }

    pub fn item_count(&self, slot: FormSlot) -> usize {
        self.form(slot).item_count()
    }

    pub fn item_counts(&self) -> BTreeMap<FormSlot, usize> {
        self.forms
            .iter()
            .map(|(slot, form)| (*slot, form.item_count()))
            .collect()
    }

    fn form_mut(&mut self, slot: FormSlot) -> &mut InvoiceForm {
        self.forms
            .entry(slot)
            .or_insert_with(|| InvoiceForm::new(slot))
    }

    fn item_mut(&mut self, slot: FormSlot, row: ItemIndex) -> Option<&mut LineItem> {
        self.form_mut(slot).items.get_mut(row.position())
    }
}

impl AggregateRoot for FormState {
    type Id = SubmissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for FormState {
    type Command = FormCommand;
    type Event = FormEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            FormEvent::LineItemAdded { slot, .. } => {
                self.form_mut(*slot).items.push(LineItem::default());
            }
            FormEvent::LineItemRemoved { slot, row } => {
                let items = &mut self.form_mut(*slot).items;
                if row.position() < items.len() {
                    items.remove(row.position());
                }
            }
            FormEvent::ItemNameChanged { slot, row, name } => {
                if let Some(item) = self.item_mut(*slot, *row) {
                    item.name = name.clone();
                }
            }
            FormEvent::ItemUsageChanged { slot, row, usage } => {
                if let Some(item) = self.item_mut(*slot, *row) {
                    item.usage = usage.clone();
                }
            }
            FormEvent::QuantityChanged { slot, row, quantity } => {
                if let Some(item) = self.item_mut(*slot, *row) {
                    item.quantity = *quantity;
                }
            }
            FormEvent::UnitPriceChanged { slot, row, price } => {
                if let Some(item) = self.item_mut(*slot, *row) {
                    item.unit_price = *price;
                }
            }
            FormEvent::CurrencySelected { slot, currency } => {
                self.form_mut(*slot).currency = *currency;
            }
            FormEvent::ProofOfPaymentCleared { slot } => {
                self.form_mut(*slot).proof_of_payment = None;
            }
            FormEvent::VendorChanged { slot, vendor_name } => {
                self.form_mut(*slot).vendor_name = vendor_name.clone();
            }
            FormEvent::InvoiceFileChanged { slot, file } => {
                self.form_mut(*slot).invoice_file = file.clone();
            }
            FormEvent::ProofOfPaymentChanged { slot, file } => {
                self.form_mut(*slot).proof_of_payment = file.clone();
            }
            FormEvent::AmountChanged { slot, field, amount } => {
                let form = self.form_mut(*slot);
                match field {
                    AmountField::Discount => form.discount = *amount,
                    AmountField::Tax => form.tax = *amount,
                    AmountField::Shipping => form.shipping = *amount,
                    AmountField::ForeignTotal => form.foreign_total = *amount,
                    AmountField::HomeAmountPaid => form.home_amount_paid = *amount,
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            FormCommand::AddLineItem { slot } => self.handle_add_item(*slot),
            FormCommand::RemoveLineItem { slot, row } => self.handle_remove_item(*slot, *row),
            FormCommand::EditItemName { slot, row, name } => {
                self.ensure_row(*slot, *row)?;
                Ok(vec![FormEvent::ItemNameChanged {
                    slot: *slot,
                    row: *row,
                    name: name.clone(),
                }])
            }
            FormCommand::EditItemUsage { slot, row, usage } => {
                self.ensure_row(*slot, *row)?;
                Ok(vec![FormEvent::ItemUsageChanged {
                    slot: *slot,
                    row: *row,
                    usage: usage.clone(),
                }])
            }
            FormCommand::EditQuantity { slot, row, quantity } => {
                self.ensure_row(*slot, *row)?;
                Ok(vec![FormEvent::QuantityChanged {
                    slot: *slot,
                    row: *row,
                    quantity: *quantity,
                }])
            }
            FormCommand::EditUnitPrice { slot, row, price } => {
                self.ensure_row(*slot, *row)?;
                ensure_non_negative("unit price", *price)?;
                Ok(vec![FormEvent::UnitPriceChanged {
                    slot: *slot,
                    row: *row,
                    price: *price,
                }])
            }
            FormCommand::SelectCurrency { slot, currency } => {
                self.handle_select_currency(*slot, *currency)
            }
            FormCommand::SetVendor { slot, vendor_name } => Ok(vec![FormEvent::VendorChanged {
                slot: *slot,
                vendor_name: vendor_name.clone(),
            }]),
            FormCommand::AttachInvoice { slot, file } => Ok(vec![FormEvent::InvoiceFileChanged {
                slot: *slot,
                file: file.clone(),
            }]),
            FormCommand::AttachProofOfPayment { slot, file } => {
                if file.is_some() && self.form(*slot).currency != Currency::Foreign {
                    return Err(DomainError::validation(format!(
                        "Proof of payment only applies to {} invoices (form {slot})",
                        Currency::Foreign.code()
                    )));
                }
                Ok(vec![FormEvent::ProofOfPaymentChanged {
                    slot: *slot,
                    file: file.clone(),
                }])
            }
            FormCommand::SetAmount {
                slot,
                field,
                amount,
            } => {
                ensure_non_negative(amount_label(*field), *amount)?;
                Ok(vec![FormEvent::AmountChanged {
                    slot: *slot,
                    field: *field,
                    amount: *amount,
                }])
            }
        }
    }
}

impl FormState {
    fn ensure_row(&self, slot: FormSlot, row: ItemIndex) -> Result<(), DomainError> {
        if self.form(slot).item(row).is_none() {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn handle_add_item(&self, slot: FormSlot) -> Result<Vec<FormEvent>, DomainError> {
        let count = self.item_count(slot);
        if count >= usize::from(ItemIndex::MAX) {
            return Err(DomainError::validation(format!(
                "Form {slot} already has the maximum of {} items",
                ItemIndex::MAX
            )));
        }

        // count < MAX, so count + 1 is a valid row number.
        let row = ItemIndex::new(count as u8 + 1)?;
        Ok(vec![FormEvent::LineItemAdded { slot, row }])
    }

    fn handle_remove_item(
        &self,
        slot: FormSlot,
        row: ItemIndex,
    ) -> Result<Vec<FormEvent>, DomainError> {
        self.ensure_row(slot, row)?;

        if self.item_count(slot) <= 1 {
            return Err(DomainError::invariant(format!(
                "Form {slot} must keep at least one item"
            )));
        }

        Ok(vec![FormEvent::LineItemRemoved { slot, row }])
    }

    fn handle_select_currency(
        &self,
        slot: FormSlot,
        currency: Currency,
    ) -> Result<Vec<FormEvent>, DomainError> {
        let form = self.form(slot);
        if form.currency == currency {
            return Ok(Vec::new());
        }

        let mut events = vec![FormEvent::CurrencySelected { slot, currency }];
        if currency == Currency::Home && form.proof_of_payment.is_some() {
            events.push(FormEvent::ProofOfPaymentCleared { slot });
        }
        Ok(events)
    }
}

fn ensure_non_negative(label: &str, amount: Money) -> Result<(), DomainError> {
    if amount.is_negative() {
        return Err(DomainError::validation(format!("{label} cannot be negative")));
    }
    Ok(())
}

fn amount_label(field: AmountField) -> &'static str {
    match field {
        AmountField::Discount => "discount",
        AmountField::Tax => "tax",
        AmountField::Shipping => "shipping",
        AmountField::ForeignTotal => "foreign total",
        AmountField::HomeAmountPaid => "amount paid",
    }
}
