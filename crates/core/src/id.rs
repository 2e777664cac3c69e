//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// One of the ten invoice sub-forms of a submission batch (1-based).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FormSlot(u8);

impl FormSlot {
    pub const MAX: u8 = 10;

    pub fn new(n: u8) -> Result<Self, DomainError> {
        if (1..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(DomainError::invalid_id(format!(
                "form slot must be between 1 and {}, got {n}",
                Self::MAX
            )))
        }
    }

    /// All slots, in display order.
    pub fn all() -> impl Iterator<Item = FormSlot> {
        (1..=Self::MAX).map(FormSlot)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// 1-based row number of a line item within its slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ItemIndex(u8);

impl ItemIndex {
    /// Maximum number of line items per invoice form.
    pub const MAX: u8 = 15;

    pub fn new(n: u8) -> Result<Self, DomainError> {
        if (1..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(DomainError::invalid_id(format!(
                "item row must be between 1 and {}, got {n}",
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in the owning item vector.
    pub fn position(self) -> usize {
        usize::from(self.0 - 1)
    }
}

macro_rules! impl_small_index {
    ($t:ty, $name:literal) => {
        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<u8> for $t {
            type Error = DomainError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for u8 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let n: u8 = s
                    .trim()
                    .parse()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::new(n)
            }
        }
    };
}

impl_small_index!(FormSlot, "FormSlot");
impl_small_index!(ItemIndex, "ItemIndex");

/// Identifier of an accepted submission batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SubmissionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("SubmissionId: {e}")))?;
        Ok(Self(uuid))
    }
}
