//! Ordered observer registry (synchronous fan-out).
//!
//! The registry is the subject side of the observer pattern:
//!
//! ```text
//! Subject (mutate, commit) → ObserverRegistry::dispatch → Observer #1
//!                                                        → Observer #2
//!                                                        → ...
//! ```
//!
//! Delivery guarantees:
//! - **Exactly once per dispatch** to each registered observer, in registration order
//! - **Fail-fast**: the first observer error stops delivery and is returned
//! - **Synchronous**: `dispatch` returns only after every notified observer returned

use std::sync::Arc;

use tracing::{debug, warn};

use splitledger_core::{LedgerError, LedgerResult};

use crate::handler::Observer;

/// Handle returned by [`ObserverRegistry::register`], used to unregister.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Observers registered with a subject, in registration order.
pub struct ObserverRegistry<M> {
    observers: Vec<(ObserverId, Arc<dyn Observer<M>>)>,
    next_id: u64,
}

impl<M> ObserverRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; it receives every event dispatched from now on.
    ///
    /// Registering the same `Arc` twice delivers each event to it twice.
    pub fn register(&mut self, observer: Arc<dyn Observer<M>>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        debug!(observer = observer.name(), %id, "observer registered");
        self.observers.push((id, observer));
        id
    }

    /// Remove a previously registered observer. Returns `false` if `id` is unknown.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        let removed = self.observers.len() != before;
        if removed {
            debug!(%id, "observer unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Names of registered observers, in delivery order.
    pub fn names(&self) -> Vec<&str> {
        self.observers.iter().map(|(_, o)| o.name()).collect()
    }

    /// Deliver `event` to every observer in registration order.
    ///
    /// Returns the number of observers notified. On the first failure, delivery stops
    /// and the failure is returned wrapped in [`LedgerError::ObserverFailed`].
    pub fn dispatch(&self, event: &M) -> LedgerResult<usize> {
        for (delivered, (id, observer)) in self.observers.iter().enumerate() {
            if let Err(err) = observer.notify(event) {
                warn!(
                    observer = observer.name(),
                    %id,
                    delivered,
                    error = %err,
                    "observer rejected event; delivery aborted"
                );
                return Err(LedgerError::observer_failed(observer.name(), err));
            }
        }
        Ok(self.observers.len())
    }
}

impl<M> Default for ObserverRegistry<M> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<M> core::fmt::Debug for ObserverRegistry<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|(id, o)| (id, o.name())))
            .finish()
    }
}
