use serde::Serialize;

use crate::currency::Currency;
use crate::invoice::InvoiceForm;

/// Visibility and required-ness of the currency-dependent fields of a form.
///
/// Derived from live form state every time it is asked for; the tax field's
/// required flag follows the subtotal on every edit, not only on currency
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPresentation {
    pub proof_of_payment_visible: bool,
    pub proof_of_payment_required: bool,
    pub tax_label: &'static str,
    pub tax_help: &'static str,
    pub tax_required: bool,
    /// Whether the `*` marker is shown next to the tax label.
    pub tax_required_marker: bool,
}

impl FieldPresentation {
    pub fn derive(form: &InvoiceForm) -> Self {
        match form.currency {
            Currency::Foreign => Self {
                proof_of_payment_visible: true,
                proof_of_payment_required: true,
                tax_label: "Taxes",
                tax_help: "Any taxes charged on the invoice, in the invoice currency (optional)",
                tax_required: false,
                tax_required_marker: false,
            },
            Currency::Home => {
                let tax_required = form.subtotal().is_positive();
                Self {
                    proof_of_payment_visible: false,
                    proof_of_payment_required: false,
                    tax_label: "HST/GST",
                    tax_help: "HST/GST charged on the invoice",
                    tax_required,
                    tax_required_marker: tax_required,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchreq_core::{FormSlot, Money};

    use crate::line_item::LineItem;

    #[test]
    fn home_tax_required_only_with_positive_subtotal() {
        let mut form = InvoiceForm::new(FormSlot::new(1).unwrap());
        let p = FieldPresentation::derive(&form);
        assert!(!p.tax_required);
        assert!(!p.proof_of_payment_visible);
        assert_eq!(p.tax_label, "HST/GST");

        form.items[0] = LineItem::new("Widget", "Test", 1, Money::from_cents(1));
        let p = FieldPresentation::derive(&form);
        assert!(p.tax_required);
        assert!(p.tax_required_marker);
    }

    #[test]
    fn foreign_makes_proof_required_and_tax_optional() {
        let mut form = InvoiceForm::new(FormSlot::new(1).unwrap());
        form.items[0] = LineItem::new("Widget", "Test", 3, Money::from_cents(250));
        form.currency = Currency::Foreign;
        let p = FieldPresentation::derive(&form);
        assert!(p.proof_of_payment_visible);
        assert!(p.proof_of_payment_required);
        assert!(!p.tax_required);
        assert_eq!(p.tax_label, "Taxes");
    }
}
