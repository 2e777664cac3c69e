use serde::{Deserialize, Serialize};

use purchreq_core::{Money, ValueObject};

/// Reference to a file the user attached to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub filename: String,
    pub size: u64,
}

impl ValueObject for FileRef {}

impl FileRef {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
        }
    }

    /// Extension of the uploaded filename, `pdf` when there is none.
    pub fn extension(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "pdf",
        }
    }
}

/// One purchased good or service within an invoice form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub usage: String,
    /// Zero until the user enters a quantity.
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(name: impl Into<String>, usage: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            quantity,
            unit_price,
        }
    }

    pub fn total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Name, usage, quantity and price all filled in.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.usage.trim().is_empty()
            && self.quantity > 0
            && self.unit_price.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn completeness_requires_every_field() {
        let full = LineItem::new("Widget", "Test", 2, Money::from_cents(500));
        assert!(full.is_complete());

        assert!(!LineItem { name: " ".into(), ..full.clone() }.is_complete());
        assert!(!LineItem { usage: String::new(), ..full.clone() }.is_complete());
        assert!(!LineItem { quantity: 0, ..full.clone() }.is_complete());
        assert!(!LineItem { unit_price: Money::ZERO, ..full }.is_complete());
    }

    #[test]
    fn file_extension_defaults_to_pdf() {
        assert_eq!(FileRef::new("receipt.png", 1).extension(), "png");
        assert_eq!(FileRef::new("archive.tar.gz", 1).extension(), "gz");
        assert_eq!(FileRef::new("receipt", 1).extension(), "pdf");
        assert_eq!(FileRef::new("receipt.", 1).extension(), "pdf");
    }

    proptest! {
        /// Property: a row total is quantity × price, exact to the cent.
        #[test]
        fn row_total_is_quantity_times_price(q in 1u32..10_000, cents in 0i64..1_000_000) {
            let item = LineItem::new("n", "u", q, Money::from_cents(cents));
            prop_assert_eq!(item.total().cents(), i64::from(q) * cents);
        }
    }
}
