//! Entities: records that keep their identity while their contents change.

use core::fmt::{Debug, Display};
use core::hash::Hash;

/// Something addressed by a stable id rather than by its contents.
///
/// Replacing an expense by id keeps the entity while amount, payer or shares
/// change; two expenses with identical contents and different ids are distinct.
pub trait Entity {
    /// Copyable, ordered identifier (used as map key and in log fields).
    type Id: Copy + Ord + Hash + Debug + Display;

    fn id(&self) -> Self::Id;

    /// True when `other` is the same entity, whatever its current contents.
    fn same_entity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
