//! `splitledger-events` — synchronous observer plumbing.
//!
//! Events here are delivered in-process, in registration order, and run to
//! completion before the publishing call returns. There is no queue and no
//! background delivery: a subject that publishes through an [`ObserverRegistry`]
//! knows, when `dispatch` returns, exactly which observers saw the event.

pub mod event;
pub mod handler;
pub mod recording;
pub mod registry;

pub use event::Event;
pub use handler::Observer;
pub use recording::RecordingObserver;
pub use registry::{ObserverId, ObserverRegistry};
