//! Value objects: compared by what they hold, never by identity.
//!
//! `Money`, `Percent` and settlement `Transaction`s are value objects; two transfers
//! of 22.00 from Charlie to Alice are the same transfer.

/// Marker trait for small, immutable values.
///
/// Value objects are `Copy`: "changing" one means computing a new one
/// (`a + b`, `pct.of(amount)`), so they can be handed across threads and stored in
/// snapshots freely.
///
/// ```ignore
/// let a = Money::from_cents(2200);
/// let b = "22.00".parse::<Money>()?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Copy + Eq + core::fmt::Debug {}
