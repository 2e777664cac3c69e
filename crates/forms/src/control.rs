//! Control-id dispatch: browser-style input events in, view updates out.

use std::sync::Arc;

use serde::Serialize;

use purchreq_core::{DomainError, FormSlot, ItemIndex, Money};
use purchreq_events::{Subscriber, SubscriberList, execute};

use crate::currency::Currency;
use crate::gatekeeper::{AcceptedBatch, SubmissionError, check_submission};
use crate::invoice::FinancialBreakdown;
use crate::line_item::FileRef;
use crate::presentation::FieldPresentation;
use crate::state::{AmountField, FormCommand, FormEvent, FormState};

/// Kind of form control. The wire prefix doubles as the HTML field name stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    VendorName,
    Currency,
    InvoiceFile,
    ProofOfPayment,
    Discount,
    Tax,
    Shipping,
    ForeignTotal,
    HomeAmountPaid,
    Subtotal,
    Total,
    ItemName,
    ItemUsage,
    ItemQuantity,
    ItemPrice,
    ItemTotal,
}

impl FieldKind {
    pub const ALL: [FieldKind; 16] = [
        FieldKind::VendorName,
        FieldKind::Currency,
        FieldKind::InvoiceFile,
        FieldKind::ProofOfPayment,
        FieldKind::Discount,
        FieldKind::Tax,
        FieldKind::Shipping,
        FieldKind::ForeignTotal,
        FieldKind::HomeAmountPaid,
        FieldKind::Subtotal,
        FieldKind::Total,
        FieldKind::ItemName,
        FieldKind::ItemUsage,
        FieldKind::ItemQuantity,
        FieldKind::ItemPrice,
        FieldKind::ItemTotal,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            FieldKind::VendorName => "vendor_name",
            FieldKind::Currency => "currency",
            FieldKind::InvoiceFile => "invoice_file",
            FieldKind::ProofOfPayment => "proof_of_payment",
            FieldKind::Discount => "discount_amount",
            FieldKind::Tax => "hst_gst_amount",
            FieldKind::Shipping => "shipping_amount",
            FieldKind::ForeignTotal => "us_total",
            FieldKind::HomeAmountPaid => "canadian_amount",
            FieldKind::Subtotal => "subtotal_amount",
            FieldKind::Total => "total_amount",
            FieldKind::ItemName => "item_name",
            FieldKind::ItemUsage => "item_usage",
            FieldKind::ItemQuantity => "item_quantity",
            FieldKind::ItemPrice => "item_price",
            FieldKind::ItemTotal => "item_total",
        }
    }

    /// Per-row controls carry an item index.
    pub fn is_item(self) -> bool {
        matches!(
            self,
            FieldKind::ItemName
                | FieldKind::ItemUsage
                | FieldKind::ItemQuantity
                | FieldKind::ItemPrice
                | FieldKind::ItemTotal
        )
    }

    /// Computed fields the user cannot type into.
    pub fn is_read_only(self) -> bool {
        matches!(
            self,
            FieldKind::Subtotal | FieldKind::Total | FieldKind::ItemTotal
        )
    }

    pub fn is_file(self) -> bool {
        matches!(self, FieldKind::InvoiceFile | FieldKind::ProofOfPayment)
    }

    fn amount_field(self) -> Option<AmountField> {
        match self {
            FieldKind::Discount => Some(AmountField::Discount),
            FieldKind::Tax => Some(AmountField::Tax),
            FieldKind::Shipping => Some(AmountField::Shipping),
            FieldKind::ForeignTotal => Some(AmountField::ForeignTotal),
            FieldKind::HomeAmountPaid => Some(AmountField::HomeAmountPaid),
            _ => None,
        }
    }
}

/// `(fieldKind, formSlot[, itemIndex])`, e.g. `item_price_3_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ControlId {
    pub kind: FieldKind,
    pub slot: FormSlot,
    pub item: Option<ItemIndex>,
}

impl ControlId {
    pub fn form(kind: FieldKind, slot: FormSlot) -> Self {
        Self {
            kind,
            slot,
            item: None,
        }
    }

    pub fn item(kind: FieldKind, slot: FormSlot, item: ItemIndex) -> Self {
        Self {
            kind,
            slot,
            item: Some(item),
        }
    }

    pub fn name(&self) -> String {
        match self.item {
            Some(item) => format!("{}_{}_{}", self.kind.prefix(), self.slot, item),
            None => format!("{}_{}", self.kind.prefix(), self.slot),
        }
    }

    /// Parse a field name. Unknown names are `None`, not an error: the
    /// submission also carries fields (submitter profile) that are not controls.
    pub fn parse(name: &str) -> Option<Self> {
        FieldKind::ALL.iter().find_map(|kind| {
            let rest = name.strip_prefix(kind.prefix())?.strip_prefix('_')?;
            if kind.is_item() {
                let (slot, item) = rest.split_once('_')?;
                Some(Self::item(*kind, number(slot)?, number(item)?))
            } else {
                Some(Self::form(*kind, number(rest)?))
            }
        })
    }
}

/// Only plain ASCII digits without a leading zero, so that `name()` round-trips.
fn number<T: core::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl core::fmt::Display for ControlId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name())
    }
}

/// User interaction with the purchase-request page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    ValueChanged { control: ControlId, value: String },
    FileSelected { control: ControlId, file: Option<FileRef> },
    AddItemClicked { slot: FormSlot },
    RemoveItemClicked { slot: FormSlot, row: ItemIndex },
}

/// What the page has to redraw after an input was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewUpdate {
    RowTotal {
        slot: FormSlot,
        row: ItemIndex,
        total: Money,
    },
    Breakdown {
        slot: FormSlot,
        breakdown: FinancialBreakdown,
    },
    Presentation {
        slot: FormSlot,
        presentation: FieldPresentation,
    },
    ItemCount {
        slot: FormSlot,
        count: usize,
        can_add: bool,
        can_remove: bool,
    },
    Warning {
        slot: Option<FormSlot>,
        message: String,
    },
}

/// Map an input event to the command it stands for.
///
/// `Ok(None)` means the event needs no state change.
pub fn command_for(input: &InputEvent) -> Result<Option<FormCommand>, DomainError> {
    match input {
        InputEvent::AddItemClicked { slot } => Ok(Some(FormCommand::AddLineItem { slot: *slot })),
        InputEvent::RemoveItemClicked { slot, row } => Ok(Some(FormCommand::RemoveLineItem {
            slot: *slot,
            row: *row,
        })),
        InputEvent::FileSelected { control, file } => {
            let slot = control.slot;
            let file = file.clone();
            match control.kind {
                FieldKind::InvoiceFile => Ok(Some(FormCommand::AttachInvoice { slot, file })),
                FieldKind::ProofOfPayment => {
                    Ok(Some(FormCommand::AttachProofOfPayment { slot, file }))
                }
                other => Err(DomainError::validation(format!(
                    "{} is not a file input",
                    other.prefix()
                ))),
            }
        }
        InputEvent::ValueChanged { control, value } => value_command(control, value),
    }
}

fn value_command(control: &ControlId, value: &str) -> Result<Option<FormCommand>, DomainError> {
    let slot = control.slot;
    let kind = control.kind;

    if kind.is_read_only() {
        return Ok(None);
    }
    if kind.is_file() {
        return Err(DomainError::validation(format!(
            "{control} expects a file selection"
        )));
    }

    if let Some(field) = kind.amount_field() {
        let amount = Money::parse_lenient(value)?;
        return Ok(Some(FormCommand::SetAmount {
            slot,
            field,
            amount,
        }));
    }

    let row = || {
        control
            .item
            .ok_or_else(|| DomainError::invalid_id(format!("{control} is missing its row")))
    };

    let cmd = match kind {
        FieldKind::VendorName => FormCommand::SetVendor {
            slot,
            vendor_name: value.to_string(),
        },
        FieldKind::Currency => FormCommand::SelectCurrency {
            slot,
            currency: Currency::from_code(value),
        },
        FieldKind::ItemName => FormCommand::EditItemName {
            slot,
            row: row()?,
            name: value.to_string(),
        },
        FieldKind::ItemUsage => FormCommand::EditItemUsage {
            slot,
            row: row()?,
            usage: value.to_string(),
        },
        FieldKind::ItemQuantity => FormCommand::EditQuantity {
            slot,
            row: row()?,
            quantity: parse_quantity(value)?,
        },
        FieldKind::ItemPrice => FormCommand::EditUnitPrice {
            slot,
            row: row()?,
            price: Money::parse_lenient(value)?,
        },
        // Read-only, file and amount kinds are handled above.
        _ => return Ok(None),
    };
    Ok(Some(cmd))
}

/// Blank means "not entered yet" (zero).
pub fn parse_quantity(value: &str) -> Result<u32, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| DomainError::validation(format!("'{value}' is not a valid quantity")))
}

/// Owns the form state and routes every input through the aggregate.
pub struct FormController {
    state: FormState,
    subscribers: SubscriberList<ViewUpdate>,
}

impl FormController {
    pub fn new(state: FormState) -> Self {
        Self {
            state,
            subscribers: SubscriberList::new(),
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn into_state(self) -> FormState {
        self.state
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn Subscriber<ViewUpdate>>) {
        self.subscribers.register(subscriber);
    }

    /// Handle one input event to completion and notify subscribers.
    ///
    /// Rejected inputs produce a single `Warning` and leave state unchanged.
    pub fn dispatch(&mut self, input: &InputEvent) -> Vec<ViewUpdate> {
        let updates = match command_for(input) {
            Ok(None) => Vec::new(),
            Ok(Some(cmd)) => match execute(&mut self.state, &cmd) {
                Ok(events) => self.updates_for(&events),
                Err(e) => vec![warning(Some(purchreq_events::Command::target_slot(&cmd)), &e)],
            },
            Err(e) => vec![warning(slot_of(input), &e)],
        };

        for update in &updates {
            self.subscribers.publish(update);
        }
        updates
    }

    /// Run the gatekeeper. A blocked batch is also reported as a warning.
    pub fn submit(&self) -> Result<AcceptedBatch, SubmissionError> {
        let result = check_submission(&self.state);
        if let Err(e) = &result {
            tracing::info!(reason = e.code(), "submission blocked");
            self.subscribers.publish(&ViewUpdate::Warning {
                slot: e.slot(),
                message: e.to_string(),
            });
        }
        result
    }

    fn updates_for(&self, events: &[FormEvent]) -> Vec<ViewUpdate> {
        let Some(slot) = events.first().map(FormEvent::slot) else {
            return Vec::new();
        };
        let form = self.state.form(slot);
        let mut updates = Vec::new();

        for event in events {
            match event {
                FormEvent::QuantityChanged { row, .. } | FormEvent::UnitPriceChanged { row, .. } => {
                    if let Some(item) = form.item(*row) {
                        updates.push(ViewUpdate::RowTotal {
                            slot,
                            row: *row,
                            total: item.total(),
                        });
                    }
                }
                FormEvent::LineItemAdded { .. } | FormEvent::LineItemRemoved { .. } => {
                    let count = form.item_count();
                    updates.push(ViewUpdate::ItemCount {
                        slot,
                        count,
                        can_add: count < usize::from(ItemIndex::MAX),
                        can_remove: count > 1,
                    });
                }
                _ => {}
            }
        }

        if events.iter().any(FormEvent::affects_subtotal)
            || events
                .iter()
                .any(|e| matches!(e, FormEvent::AmountChanged { .. }))
        {
            updates.push(ViewUpdate::Breakdown {
                slot,
                breakdown: form.breakdown(),
            });
        }

        // Recomputed on every change: tax required-ness tracks the live subtotal.
        updates.push(ViewUpdate::Presentation {
            slot,
            presentation: FieldPresentation::derive(form),
        });
        updates
    }
}

fn slot_of(input: &InputEvent) -> Option<FormSlot> {
    match input {
        InputEvent::ValueChanged { control, .. } | InputEvent::FileSelected { control, .. } => {
            Some(control.slot)
        }
        InputEvent::AddItemClicked { slot } | InputEvent::RemoveItemClicked { slot, .. } => {
            Some(*slot)
        }
    }
}

fn warning(slot: Option<FormSlot>, error: &DomainError) -> ViewUpdate {
    tracing::debug!(?slot, %error, "input rejected");
    ViewUpdate::Warning {
        slot,
        message: error.user_message(),
    }
}
