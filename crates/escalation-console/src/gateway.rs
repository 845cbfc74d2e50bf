//! In-memory ticket backend for the console host
//!
//! Logs every call, records it, and reports level changes so the host can
//! restart its countdown.

use async_trait::async_trait;
use escalation::{
    EscalationLevel, GatewayCall, GatewayError, LevelStatus, RecordingGateway, TicketGateway,
    TicketId,
};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ConsoleGateway {
    inner: RecordingGateway,
    level_changes: mpsc::UnboundedSender<EscalationLevel>,
}

impl ConsoleGateway {
    /// Gateway plus the receiving end of its level-change feed
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EscalationLevel>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                inner: RecordingGateway::new(),
                level_changes: tx,
            },
            rx,
        )
    }

    pub fn fail_with(&self, error: GatewayError) {
        self.inner.fail_with(error);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.inner.calls()
    }

    fn level_changed(&self, level: EscalationLevel) {
        // Receiver gone means the host is shutting down
        let _ = self.level_changes.send(level);
    }
}

#[async_trait]
impl TicketGateway for ConsoleGateway {
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        info!(%ticket, level = %new_level, note, "Next level");
        self.inner.on_next_level(ticket, new_level, note).await?;
        self.level_changed(new_level);
        Ok(())
    }

    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        info!(%ticket, level = %new_level, note, "Previous level");
        self.inner.on_previous_level(ticket, new_level, note).await?;
        self.level_changed(new_level);
        Ok(())
    }

    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError> {
        info!(%ticket, key = %level.status_key(), %status, "Update status");
        self.inner.update_status_final(ticket, level, status).await
    }

    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        info!(%ticket, %level, note, "Update observation");
        self.inner.update_observation(ticket, level, note).await
    }
}
