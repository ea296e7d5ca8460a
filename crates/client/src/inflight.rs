//! At-most-one-in-flight tracking for review actions.
//!
//! A repeat trigger for the same ticket and decision while the first request
//! is unresolved is refused rather than sent a second time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use extickets_core::{ReviewDecision, TicketId};

/// Identifies one review action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub ticket_id: TicketId,
    pub decision: ReviewDecision,
}

impl ActionKey {
    #[must_use]
    pub const fn new(ticket_id: TicketId, decision: ReviewDecision) -> Self {
        Self {
            ticket_id,
            decision,
        }
    }
}

/// Set of actions currently awaiting the backend.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<ActionKey>>>,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as in flight.
    ///
    /// Returns `None` if it already is. The marker is released when the
    /// returned guard drops.
    #[must_use]
    pub fn try_begin(&self, key: ActionKey) -> Option<InFlightGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    /// Whether `key` is currently in flight.
    #[must_use]
    pub fn contains(&self, key: &ActionKey) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its action marker on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<ActionKey>>>,
    key: ActionKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
