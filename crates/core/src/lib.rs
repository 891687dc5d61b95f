//! `splitledger-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, integer money, percentages and the shared error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{LedgerError, LedgerResult};
pub use id::{ExpenseId, UserId};
pub use money::{Money, Percent};
pub use value_object::ValueObject;
