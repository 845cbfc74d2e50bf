//! Event types emitted by the escalation dialog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::EscalationLevel;
use crate::machine::Action;
use crate::note::NoteRejection;
use crate::ticket::{Lifecycle, TicketId};

/// Everything the dialog reports to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogEvent {
    /// A transition was attempted with an invalid note
    NoteRejected {
        ticket: TicketId,
        action: Action,
        rejection: NoteRejection,
        timestamp: DateTime<Utc>,
    },

    /// Gateway calls for a transition are about to run
    TransitionStarted {
        ticket: TicketId,
        action: Action,
        from: EscalationLevel,
        timestamp: DateTime<Utc>,
    },

    /// All gateway calls succeeded and the transition was committed
    TransitionCompleted {
        ticket: TicketId,
        action: Action,
        from: EscalationLevel,
        to: EscalationLevel,
        lifecycle: Lifecycle,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A gateway call failed; nothing was committed
    TransitionFailed {
        ticket: TicketId,
        action: Action,
        from: EscalationLevel,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The dialog was closed, by the user or after a transition
    DialogClosed {
        ticket: TicketId,
        timestamp: DateTime<Utc>,
    },
}

impl DialogEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DialogEvent::NoteRejected { timestamp, .. } => *timestamp,
            DialogEvent::TransitionStarted { timestamp, .. } => *timestamp,
            DialogEvent::TransitionCompleted { timestamp, .. } => *timestamp,
            DialogEvent::TransitionFailed { timestamp, .. } => *timestamp,
            DialogEvent::DialogClosed { timestamp, .. } => *timestamp,
        }
    }

    pub fn ticket(&self) -> TicketId {
        match self {
            DialogEvent::NoteRejected { ticket, .. }
            | DialogEvent::TransitionStarted { ticket, .. }
            | DialogEvent::TransitionCompleted { ticket, .. }
            | DialogEvent::TransitionFailed { ticket, .. }
            | DialogEvent::DialogClosed { ticket, .. } => *ticket,
        }
    }

    /// Action involved, if the event belongs to a transition attempt
    pub fn action(&self) -> Option<Action> {
        match self {
            DialogEvent::NoteRejected { action, .. }
            | DialogEvent::TransitionStarted { action, .. }
            | DialogEvent::TransitionCompleted { action, .. }
            | DialogEvent::TransitionFailed { action, .. } => Some(*action),
            DialogEvent::DialogClosed { .. } => None,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DialogEvent::NoteRejected { .. } => "note_rejected",
            DialogEvent::TransitionStarted { .. } => "transition_started",
            DialogEvent::TransitionCompleted { .. } => "transition_completed",
            DialogEvent::TransitionFailed { .. } => "transition_failed",
            DialogEvent::DialogClosed { .. } => "dialog_closed",
        }
    }
}
