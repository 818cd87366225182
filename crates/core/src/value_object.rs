//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attributes:
/// two ship-to addresses with the same lines, city and codes are the same
/// address, and two tax components with the same name, rate and amount are
/// interchangeable. "Changing" one means replacing it with a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct TaxComponent { name: String, rate: Decimal, amount: Decimal }
///
/// impl ValueObject for TaxComponent {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
