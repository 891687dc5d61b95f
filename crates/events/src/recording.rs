//! In-memory recording observer for tests/dev.

use std::sync::Mutex;

use splitledger_core::{LedgerError, LedgerResult};

use crate::handler::Observer;

/// Observer that remembers every event it receives.
///
/// - No IO
/// - Optionally fails on demand (exercise fail-fast delivery)
#[derive(Debug)]
pub struct RecordingObserver<M> {
    name: String,
    received: Mutex<Vec<M>>,
    fail_with: Option<LedgerError>,
}

impl<M> RecordingObserver<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            received: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// An observer that rejects every event with `error`, recording nothing.
    pub fn failing(name: impl Into<String>, error: LedgerError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(name)
        }
    }

    pub fn len(&self) -> usize {
        self.received.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M: Clone> RecordingObserver<M> {
    /// Snapshot of the events received so far, in delivery order.
    pub fn received(&self) -> Vec<M> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl<M> Observer<M> for RecordingObserver<M>
where
    M: Clone + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn notify(&self, event: &M) -> LedgerResult<()> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        // A poisoned lock only happens if a test panicked mid-push.
        if let Ok(mut received) = self.received.lock() {
            received.push(event.clone());
        }
        Ok(())
    }
}
