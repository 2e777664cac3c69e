use serde::{Deserialize, Serialize};

use purchreq_core::{FormSlot, ItemIndex, Money, ValueObject};

use crate::currency::Currency;
use crate::line_item::{FileRef, LineItem};

/// Derived money summary of one invoice form. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialBreakdown {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    /// `max(0, subtotal − discount + tax + shipping)`.
    pub total: Money,
}

impl ValueObject for FinancialBreakdown {}

impl FinancialBreakdown {
    pub fn compute(subtotal: Money, discount: Money, tax: Money, shipping: Money) -> Self {
        let total = subtotal
            .saturating_sub(discount)
            .saturating_add(tax)
            .saturating_add(shipping)
            .non_negative();
        Self {
            subtotal,
            discount,
            tax,
            shipping,
            total,
        }
    }
}

/// One invoice sub-form of a submission batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceForm {
    pub slot: FormSlot,
    pub currency: Currency,
    pub vendor_name: String,
    pub invoice_file: Option<FileRef>,
    pub proof_of_payment: Option<FileRef>,
    pub items: Vec<LineItem>,
    pub discount: Money,
    pub tax: Money,
    pub shipping: Money,
    /// FOREIGN only: invoice total as printed, in the foreign currency.
    pub foreign_total: Money,
    /// FOREIGN only: what was actually paid, in the home currency.
    pub home_amount_paid: Money,
}

impl InvoiceForm {
    /// A fresh form: HOME currency, one empty item row.
    pub fn new(slot: FormSlot) -> Self {
        Self {
            slot,
            currency: Currency::Home,
            vendor_name: String::new(),
            invoice_file: None,
            proof_of_payment: None,
            items: vec![LineItem::default()],
            discount: Money::ZERO,
            tax: Money::ZERO,
            shipping: Money::ZERO,
            foreign_total: Money::ZERO,
            home_amount_paid: Money::ZERO,
        }
    }

    /// A slot with a blank vendor is treated as unused.
    pub fn is_blank(&self) -> bool {
        self.vendor_name.trim().is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, row: ItemIndex) -> Option<&LineItem> {
        self.items.get(row.position())
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::total).sum()
    }

    pub fn breakdown(&self) -> FinancialBreakdown {
        FinancialBreakdown::compute(self.subtotal(), self.discount, self.tax, self.shipping)
    }

    pub fn complete_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.is_complete())
    }

    pub fn has_complete_item(&self) -> bool {
        self.items.iter().any(LineItem::is_complete)
    }

    /// Home amount paid per unit of foreign currency, rounded to 4 decimals.
    ///
    /// Zero for HOME forms or when there is nothing to divide by.
    pub fn conversion_rate(&self) -> f64 {
        if self.currency != Currency::Foreign {
            return 0.0;
        }
        let foreign = self.subtotal().saturating_add(self.tax);
        if !foreign.is_positive() {
            return 0.0;
        }
        let rate = self.home_amount_paid.as_f64() / foreign.as_f64();
        (rate * 10_000.0).round() / 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn slot(n: u8) -> FormSlot {
        FormSlot::new(n).unwrap()
    }

    #[test]
    fn new_form_has_one_empty_row() {
        let form = InvoiceForm::new(slot(1));
        assert_eq!(form.item_count(), 1);
        assert!(form.is_blank());
        assert_eq!(form.subtotal(), Money::ZERO);
        assert!(!form.has_complete_item());
    }

    #[test]
    fn breakdown_clamps_to_zero() {
        let b = FinancialBreakdown::compute(
            Money::from_cents(1000),
            Money::from_cents(5000),
            Money::from_cents(100),
            Money::ZERO,
        );
        assert_eq!(b.total, Money::ZERO);
    }

    #[test]
    fn conversion_rate_uses_subtotal_plus_tax() {
        let mut form = InvoiceForm::new(slot(2));
        form.currency = Currency::Foreign;
        form.items[0] = LineItem::new("Board", "Robot", 1, Money::from_cents(10_000));
        form.tax = Money::from_cents(0);
        form.home_amount_paid = Money::from_cents(13_725);
        assert_eq!(form.conversion_rate(), 1.3725);

        form.currency = Currency::Home;
        assert_eq!(form.conversion_rate(), 0.0);
    }

    proptest! {
        /// Property: the final total is never negative and matches the formula.
        #[test]
        fn final_total_formula(
            subtotal in 0i64..10_000_000,
            discount in 0i64..10_000_000,
            tax in 0i64..1_000_000,
            shipping in 0i64..1_000_000,
        ) {
            let b = FinancialBreakdown::compute(
                Money::from_cents(subtotal),
                Money::from_cents(discount),
                Money::from_cents(tax),
                Money::from_cents(shipping),
            );
            let expected = (subtotal - discount + tax + shipping).max(0);
            prop_assert_eq!(b.total.cents(), expected);
            prop_assert!(!b.total.is_negative());
        }
    }
}
