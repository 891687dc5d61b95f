use std::sync::Arc;

use splitledger_core::LedgerResult;

/// Receives events from a subject (observer abstraction).
///
/// Observers are called synchronously, on the publishing thread, in the order they
/// were registered. An observer that returns an error stops delivery to every
/// observer registered after it; the error is surfaced to whoever published.
///
/// ## Atomicity
///
/// An observer must apply an event fully or not at all. Returning `Err` means the
/// observer's own state is unchanged by this event.
///
/// ## Thread Safety
///
/// Observers take `&self` and must be `Send + Sync`: read models answer queries
/// from other threads while the subject holds them in its registry. Interior
/// mutability (typically an `RwLock`) is the observer's concern.
pub trait Observer<M>: Send + Sync {
    /// Stable name used in logs and in `ObserverFailed` errors.
    fn name(&self) -> &str;

    /// Handle one event.
    fn notify(&self, event: &M) -> LedgerResult<()>;
}

impl<M, O> Observer<M> for Arc<O>
where
    O: Observer<M> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn notify(&self, event: &M) -> LedgerResult<()> {
        (**self).notify(event)
    }
}
