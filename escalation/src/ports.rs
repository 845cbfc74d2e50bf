//! Ports the host implements
//!
//! The dialog treats persistence and timer resets as black boxes. Each call
//! is awaited to completion; there is no timeout or cancellation here.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::level::EscalationLevel;
use crate::ticket::{LevelStatus, TicketId};

/// Persistence callbacks supplied by the host
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketGateway: Send + Sync {
    /// Persist an advance to `new_level` and reset the host's timer
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError>;

    /// Persist a retreat to `new_level` and reset the host's timer
    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError>;

    /// Mark a level's status; the storage key is `level.status_key()`
    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError>;

    /// Persist the note against a level
    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: TicketGateway + ?Sized> TicketGateway for Arc<G> {
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        (**self).on_next_level(ticket, new_level, note).await
    }

    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        (**self).on_previous_level(ticket, new_level, note).await
    }

    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError> {
        (**self).update_status_final(ticket, level, status).await
    }

    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        (**self).update_observation(ticket, level, note).await
    }
}

/// One call received by a [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum GatewayCall {
    NextLevel {
        ticket: TicketId,
        level: EscalationLevel,
        note: String,
    },
    PreviousLevel {
        ticket: TicketId,
        level: EscalationLevel,
        note: String,
    },
    StatusFinal {
        ticket: TicketId,
        key: String,
        status: LevelStatus,
    },
    Observation {
        ticket: TicketId,
        level: EscalationLevel,
        note: String,
    },
}

/// In-memory gateway that records calls and can be told to fail
///
/// Used by the demo host and by tests. Calls are recorded before the
/// failure check, so a failing gateway still shows what was attempted.
#[derive(Debug, Default, Clone)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    failure: Arc<Mutex<Option<GatewayError>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: GatewayError) {
        *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
    }

    /// Stop failing
    pub fn recover(&self) {
        *self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        tracing::debug!(?call, "Gateway call");
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);

        match self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TicketGateway for RecordingGateway {
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::NextLevel {
            ticket,
            level: new_level,
            note: note.to_string(),
        })
    }

    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::PreviousLevel {
            ticket,
            level: new_level,
            note: note.to_string(),
        })
    }

    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::StatusFinal {
            ticket,
            key: level.status_key(),
            status,
        })
    }

    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Observation {
            ticket,
            level,
            note: note.to_string(),
        })
    }
}
