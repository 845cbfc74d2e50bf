//! Escalation error types
//!
//! Every fallible operation in the crate returns [`EscalationResult`].
//! Gateway failures are kept as their own type so hosts can tell a rejected
//! note apart from a persistence problem.

use thiserror::Error;

use crate::note::NoteRejection;
use crate::ticket::TicketId;

/// Result type alias for escalation operations
pub type EscalationResult<T> = Result<T, EscalationError>;

/// Errors raised by the dialog and the state machine
#[derive(Debug, Error)]
pub enum EscalationError {
    /// The observation note did not pass validation
    #[error("Invalid observation note: {0}")]
    InvalidNote(NoteRejection),

    /// Advance or finish attempted on a finalized ticket
    #[error("Ticket {ticket} is already finalized")]
    AlreadyFinalized { ticket: TicketId },

    /// Another transition is still in flight
    #[error("A transition is already in progress")]
    Busy,

    /// Level number outside 1..=5
    #[error("Escalation level {value} is out of range (expected 1-5)")]
    LevelOutOfRange { value: i64 },

    /// A caller-supplied gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Ticket metadata could not be interpreted
    #[error("Invalid ticket data: {message}")]
    InvalidTicketData { message: String },
}

impl EscalationError {
    /// Create an invalid ticket data error
    pub fn invalid_ticket_data(message: impl Into<String>) -> Self {
        Self::InvalidTicketData {
            message: message.into(),
        }
    }

    /// Whether the error left the dialog untouched and the user can simply retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidNote(_) | Self::Busy | Self::Gateway(_)
        )
    }
}

impl From<NoteRejection> for EscalationError {
    fn from(rejection: NoteRejection) -> Self {
        Self::InvalidNote(rejection)
    }
}

/// Failure reported by a [`TicketGateway`](crate::ports::TicketGateway) call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Create a request failure
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }
}
