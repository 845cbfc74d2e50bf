//! Escalation dialog controller
//!
//! Owns the note draft, the busy flag and the open flag for one ticket, and
//! drives the [`EscalationMachine`] through the host's [`TicketGateway`].
//!
//! All methods take `&self`; state sits behind a mutex so a render loop can
//! call [`EscalationDialog::view`] while a transition is awaiting the
//! gateway. The lock is never held across an `.await`.
//!
//! # Transition sequence
//!
//! ```text
//! busy? ──yes──▶ Err(Busy)
//!   │no
//! validate note ──fail──▶ warning notice, Err(InvalidNote)
//!   │ok
//! plan ──finalized──▶ warning notice, Err(AlreadyFinalized)
//!   │  ──retreat at level 1──▶ Ok(Unchanged)
//!   │plan
//! busy = true ─▶ gateway calls ─┬─ok──▶ commit, clear note, close, success notice
//!                               └─err─▶ error notice, nothing committed
//! busy = false
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::countdown::{ClockFormatter, TimeFormatter};
use crate::error::{EscalationError, EscalationResult, GatewayError};
use crate::events::{DialogEvent, SharedEventBus};
use crate::level::EscalationLevel;
use crate::machine::{Action, EscalationMachine, PlanRejection, TransitionPlan};
use crate::note::{NoteDraft, ValidNote};
use crate::notify::{Notice, Notifier};
use crate::ports::TicketGateway;
use crate::ticket::{Lifecycle, LevelStatus, TicketId, TicketRecord};
use crate::view::{DialogView, ViewInput};

/// What the host passes when opening the dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogProps {
    pub ticket: TicketRecord,
    pub level: EscalationLevel,
    pub remaining_secs: i64,
}

/// Result of a transition that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Level changed
    Moved {
        from: EscalationLevel,
        to: EscalationLevel,
    },
    /// Ticket finalized at `level`
    Finalized { level: EscalationLevel },
    /// Nothing to do (retreat at level 1)
    Unchanged,
}

struct DialogState {
    record: TicketRecord,
    machine: EscalationMachine,
    draft: NoteDraft,
    remaining_secs: i64,
    busy: bool,
    open: bool,
}

/// Headless escalation dialog for one ticket
pub struct EscalationDialog {
    state: Mutex<DialogState>,
    gateway: Arc<dyn TicketGateway>,
    notifier: Arc<dyn Notifier>,
    formatter: Arc<dyn TimeFormatter>,
    events: Option<SharedEventBus>,
}

impl EscalationDialog {
    /// Open a dialog with the bundled `MM:SS` formatter and no event bus
    pub fn open(
        props: DialogProps,
        gateway: Arc<dyn TicketGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let lifecycle = props.ticket.lifecycle_at(props.level);
        let machine = EscalationMachine::new(props.ticket.id, props.level, lifecycle);

        info!(summary = %machine.summary(), "Escalation dialog opened");

        Self {
            state: Mutex::new(DialogState {
                record: props.ticket,
                machine,
                draft: NoteDraft::new(),
                remaining_secs: props.remaining_secs,
                busy: false,
                open: true,
            }),
            gateway,
            notifier,
            formatter: Arc::new(ClockFormatter),
            events: None,
        }
    }

    /// Use the host's time formatter
    pub fn with_formatter(mut self, formatter: Arc<dyn TimeFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Publish [`DialogEvent`]s on `bus`
    pub fn with_events(mut self, bus: SharedEventBus) -> Self {
        self.events = Some(bus);
        self
    }

    fn lock(&self) -> MutexGuard<'_, DialogState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: DialogEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn ticket(&self) -> TicketId {
        self.lock().record.id
    }

    /// Local copy of the ticket record, with the statuses this dialog set
    ///
    /// A level left by advance or finish is marked finished; the level an
    /// active ticket retreats to is marked running again, so the record can
    /// be passed back to [`sync`](Self::sync).
    pub fn record(&self) -> TicketRecord {
        self.lock().record.clone()
    }

    pub fn level(&self) -> EscalationLevel {
        self.lock().machine.level()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lock().machine.lifecycle()
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().machine.is_finalized()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn remaining_secs(&self) -> i64 {
        self.lock().remaining_secs
    }

    pub fn note(&self) -> String {
        self.lock().draft.as_str().to_string()
    }

    /// Number of committed transitions
    pub fn transition_count(&self) -> usize {
        self.lock().machine.transitions().len()
    }

    // ── Host inputs ──────────────────────────────────────────────────

    /// Replace the note draft; input past the cap is dropped
    pub fn set_note(&self, text: &str) -> EscalationResult<()> {
        let mut state = self.lock();
        if state.busy {
            return Err(EscalationError::Busy);
        }
        state.draft.set(text);
        Ok(())
    }

    /// Append to the note draft
    pub fn append_note(&self, text: &str) -> EscalationResult<()> {
        let mut state = self.lock();
        if state.busy {
            return Err(EscalationError::Busy);
        }
        state.draft.push_str(text);
        Ok(())
    }

    /// Push the host's countdown value
    pub fn set_remaining(&self, remaining_secs: i64) {
        self.lock().remaining_secs = remaining_secs;
    }

    /// Push fresh host data; lifecycle is derived again from the record
    pub fn sync(&self, record: TicketRecord, level: EscalationLevel) {
        let mut state = self.lock();
        let lifecycle = record.lifecycle_at(level);
        state.machine.reset(level, lifecycle);
        state.record = record;
        debug!(summary = %state.machine.summary(), "Dialog synced with host data");
    }

    /// Show the dialog again; the draft is kept
    pub fn reopen(&self) {
        self.lock().open = true;
    }

    pub fn close(&self) {
        let ticket = {
            let mut state = self.lock();
            if !state.open {
                return;
            }
            state.open = false;
            state.record.id
        };
        self.publish(DialogEvent::DialogClosed {
            ticket,
            timestamp: Utc::now(),
        });
    }

    /// Snapshot of everything a front end needs to draw the dialog
    pub fn view(&self) -> DialogView {
        let state = self.lock();
        DialogView::project(ViewInput {
            ticket: state.record.id,
            level: state.machine.level(),
            lifecycle: state.machine.lifecycle(),
            draft: &state.draft,
            remaining_secs: state.remaining_secs,
            busy: state.busy,
            open: state.open,
            formatter: self.formatter.as_ref(),
        })
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Move to the next level, or finalize at level 5
    pub async fn advance(&self) -> EscalationResult<TransitionOutcome> {
        self.run(Action::Advance).await
    }

    /// Move back one level; a no-op at level 1
    pub async fn retreat(&self) -> EscalationResult<TransitionOutcome> {
        self.run(Action::Retreat).await
    }

    /// Resolve the ticket at the current level
    pub async fn finish(&self) -> EscalationResult<TransitionOutcome> {
        self.run(Action::Finish).await
    }

    async fn run(&self, action: Action) -> EscalationResult<TransitionOutcome> {
        let (ticket, plan, note) = match self.prepare(action) {
            Ok(Some(prepared)) => prepared,
            Ok(None) => return Ok(TransitionOutcome::Unchanged),
            Err(err) => return Err(err),
        };

        let from = plan.from_level();
        self.publish(DialogEvent::TransitionStarted {
            ticket,
            action,
            from,
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let result = self.perform(ticket, plan, &note).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => Ok(self.complete(ticket, plan, duration_ms)),
            Err(err) => {
                self.lock().busy = false;

                error!(
                    ticket = %ticket,
                    action = %action,
                    level = %from,
                    error = %err,
                    "Escalation transition failed"
                );
                self.notifier.notify(Notice::destructive(
                    "❌ Erro na Operação",
                    "Ocorreu um erro ao processar a ação. Verifique os logs.",
                ));
                self.publish(DialogEvent::TransitionFailed {
                    ticket,
                    action,
                    from,
                    error: err.to_string(),
                    timestamp: Utc::now(),
                });

                Err(EscalationError::Gateway(err))
            }
        }
    }

    /// Guards, validation and planning; marks the dialog busy on success
    fn prepare(
        &self,
        action: Action,
    ) -> EscalationResult<Option<(TicketId, TransitionPlan, ValidNote)>> {
        let mut state = self.lock();
        if state.busy {
            debug!(action = %action, "Transition ignored while busy");
            return Err(EscalationError::Busy);
        }

        let ticket = state.record.id;

        let note = match state.draft.validate() {
            Ok(note) => note,
            Err(rejection) => {
                drop(state);
                debug!(ticket = %ticket, action = %action, %rejection, "Note rejected");
                self.notifier.notify(rejection.notice());
                self.publish(DialogEvent::NoteRejected {
                    ticket,
                    action,
                    rejection,
                    timestamp: Utc::now(),
                });
                return Err(rejection.into());
            }
        };

        let plan = match state.machine.plan(action) {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                debug!(ticket = %ticket, "Retreat at first level, nothing to do");
                return Ok(None);
            }
            Err(PlanRejection::Finalized) => {
                drop(state);
                self.notifier.notify(Notice::destructive(
                    "⚠️ Chamado já finalizado",
                    "Não é possível alterar níveis pois o chamado está finalizado",
                ));
                return Err(EscalationError::AlreadyFinalized { ticket });
            }
        };

        state.busy = true;
        Ok(Some((ticket, plan, note)))
    }

    /// Run the gateway calls a plan requires
    async fn perform(
        &self,
        ticket: TicketId,
        plan: TransitionPlan,
        note: &ValidNote,
    ) -> Result<(), GatewayError> {
        let gateway = &self.gateway;

        match plan {
            TransitionPlan::Advance { from, to } => {
                gateway
                    .update_status_final(ticket, from, LevelStatus::Finished)
                    .await?;
                gateway
                    .update_observation(ticket, from, note.as_str())
                    .await?;
                gateway.on_next_level(ticket, to, note.as_str()).await?;
            }
            TransitionPlan::FinalizeAtTop { level } | TransitionPlan::Finish { level } => {
                // Both calls run to completion even when one of them fails
                let (status, observation) = futures::join!(
                    gateway.update_status_final(ticket, level, LevelStatus::Finished),
                    gateway.update_observation(ticket, level, note.as_str()),
                );
                status?;
                observation?;
            }
            TransitionPlan::Retreat { to, .. } => {
                gateway.on_previous_level(ticket, to, note.as_str()).await?;
            }
        }

        Ok(())
    }

    /// Commit a plan whose calls all succeeded
    fn complete(
        &self,
        ticket: TicketId,
        plan: TransitionPlan,
        duration_ms: u64,
    ) -> TransitionOutcome {
        let record = {
            let mut state = self.lock();
            state.busy = false;
            let record = state.machine.commit(plan).clone();
            match plan {
                TransitionPlan::Retreat {
                    to,
                    lifecycle: Lifecycle::Active,
                    ..
                } => state.record.set_level_status(to, LevelStatus::Running),
                _ if plan.finishes_current_level() => state
                    .record
                    .set_level_status(plan.from_level(), LevelStatus::Finished),
                _ => {}
            }
            state.draft.clear();
            state.open = false;
            record
        };

        info!(
            ticket = %ticket,
            action = %record.action,
            from = %record.from,
            to = %record.to,
            lifecycle = %record.lifecycle,
            duration_ms,
            "Escalation transition completed"
        );

        self.notifier.notify(success_notice(ticket, plan));
        self.publish(DialogEvent::TransitionCompleted {
            ticket,
            action: record.action,
            from: record.from,
            to: record.to,
            lifecycle: record.lifecycle,
            duration_ms,
            timestamp: Utc::now(),
        });
        self.publish(DialogEvent::DialogClosed {
            ticket,
            timestamp: Utc::now(),
        });

        match plan {
            TransitionPlan::Advance { from, to } | TransitionPlan::Retreat { from, to, .. } => {
                TransitionOutcome::Moved { from, to }
            }
            TransitionPlan::FinalizeAtTop { level } | TransitionPlan::Finish { level } => {
                TransitionOutcome::Finalized { level }
            }
        }
    }
}

fn success_notice(ticket: TicketId, plan: TransitionPlan) -> Notice {
    match plan {
        TransitionPlan::Advance { to, .. } => {
            let title = to.info().title;
            Notice::success(
                format!("🚀 {} Iniciado", title),
                format!("Timer de 20 minutos iniciado para {}", title),
            )
        }
        TransitionPlan::Retreat { to, .. } => {
            let title = to.info().title;
            Notice::success(
                format!("⬅️ Retornando para {}", title),
                format!("Timer reiniciado para {}", title),
            )
        }
        TransitionPlan::FinalizeAtTop { .. } | TransitionPlan::Finish { .. } => Notice::success(
            "✅ Chamado Finalizado",
            format!("Chamado {} foi finalizado com sucesso!", ticket.0),
        ),
    }
}
