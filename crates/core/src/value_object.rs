//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two amounts of
/// `10.00` are the same amount, whichever form they came from. To "modify" a
/// value object, create a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
