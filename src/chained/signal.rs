use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use super::chain::Content;
use crate::errors::ReadError;

pub type Outcome = std::result::Result<Content, ReadError>;

/// Single-use gate carrying the outcome of a read chain.
///
/// Opened once; every waiter, before or after that point,
/// sees the same outcome.
#[derive(Default)]
pub struct CompletionSignal {
    outcome: Mutex<Option<Outcome>>,
    opened: Condvar,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate. Returns `false` if it was already open,
    /// in which case `outcome` is discarded.
    pub fn open(&self, outcome: Outcome) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            log::warn!("completion signal opened twice, ignoring");
            return false;
        }
        *slot = Some(outcome);
        drop(slot);
        self.opened.notify_all();
        true
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub fn wait(&self) -> Outcome {
        let mut slot = self.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self
                .opened
                .wait(slot)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Like [`CompletionSignal::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let slot = self.lock();
        let (slot, _) = self
            .opened
            .wait_timeout_while(slot, timeout, |outcome| outcome.is_none())
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone()
    }

    // The slot is only ever written whole, a poisoned lock still
    // holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, Option<Outcome>> {
        self.outcome
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
