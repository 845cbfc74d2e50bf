//! Bounded in-memory event history
//!
//! Hosts that want an audit trail attach an [`EventHistory`] to the bus.
//! Oldest events are evicted once the capacity is reached.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::bus::EventBus;
use super::types::DialogEvent;
use crate::machine::Action;
use crate::ticket::TicketId;

/// Default number of events retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Ring buffer of recent dialog events
#[derive(Debug, Clone)]
pub struct EventHistory {
    events: Arc<Mutex<VecDeque<DialogEvent>>>,
    capacity: usize,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, event: DialogEvent) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// All retained events, oldest first
    pub fn events(&self) -> Vec<DialogEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn ticket_events(&self, ticket: TicketId) -> Vec<DialogEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.ticket() == ticket)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats::default();
        for event in self.events() {
            stats.record_event(&event);
        }
        stats
    }

    /// Spawn a task that copies every bus event into this history
    ///
    /// The task ends when the bus is dropped.
    pub fn attach(&self, bus: &EventBus) -> JoinHandle<()> {
        let history = self.clone();
        let mut receiver = bus.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => history.record(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event history lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event bus closed, history detached");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Counts per outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_events: usize,
    pub rejected_notes: usize,
    pub completed: usize,
    pub failed: usize,
    pub advances: usize,
    pub retreats: usize,
    pub finishes: usize,
}

impl HistoryStats {
    fn record_event(&mut self, event: &DialogEvent) {
        self.total_events += 1;
        match event {
            DialogEvent::NoteRejected { .. } => self.rejected_notes += 1,
            DialogEvent::TransitionCompleted { action, .. } => {
                self.completed += 1;
                match action {
                    Action::Advance => self.advances += 1,
                    Action::Retreat => self.retreats += 1,
                    Action::Finish => self.finishes += 1,
                }
            }
            DialogEvent::TransitionFailed { .. } => self.failed += 1,
            DialogEvent::TransitionStarted { .. } | DialogEvent::DialogClosed { .. } => {}
        }
    }
}
