use chrono::{DateTime, Utc};

/// A fact published by a subject to its observers.
///
/// Each subject publishes one closed enum of events; the enum implements this trait
/// so observers and logs can name what happened without matching on it.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted event name, e.g. `"ledger.expense.added"`.
    fn event_type(&self) -> &'static str;

    /// Payload version, bumped when the event's fields change shape.
    fn version(&self) -> u32;

    /// Wall-clock time the subject committed the change.
    fn occurred_at(&self) -> DateTime<Utc>;
}
