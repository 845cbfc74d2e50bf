//! Integration tests for the escalation dialog
//!
//! Drives [`EscalationDialog`] through the public API with the in-memory
//! gateway and notifier, covering the full validate → plan → call → commit
//! flow, the busy guard, and the event stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use escalation::{
    Action, DialogEvent, DialogProps, EscalationDialog, EscalationError, EscalationLevel,
    EventBus, EventHistory, GatewayCall, GatewayError, Lifecycle, LevelStatus, NoteRejection,
    RecordingGateway, RecordingNotifier, Severity, TicketGateway, TicketId, TicketRecord,
    TicketStatus, TransitionOutcome,
};
use tokio::sync::Notify;

const NOTE: &str = "Diagnóstico concluído";

fn level(n: u8) -> EscalationLevel {
    EscalationLevel::new(n).expect("valid level")
}

fn open_dialog(
    record: TicketRecord,
    at: u8,
) -> (EscalationDialog, RecordingGateway, RecordingNotifier) {
    let gateway = RecordingGateway::new();
    let notifier = RecordingNotifier::new();
    let dialog = EscalationDialog::open(
        DialogProps {
            ticket: record,
            level: level(at),
            remaining_secs: 900,
        },
        Arc::new(gateway.clone()),
        Arc::new(notifier.clone()),
    );
    (dialog, gateway, notifier)
}

/// Gateway that parks every call until released
struct GatedGateway {
    inner: RecordingGateway,
    release: Arc<Notify>,
}

impl GatedGateway {
    async fn wait(&self) {
        self.release.notified().await;
    }
}

#[async_trait]
impl TicketGateway for GatedGateway {
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.wait().await;
        self.inner.on_next_level(ticket, new_level, note).await
    }

    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.wait().await;
        self.inner.on_previous_level(ticket, new_level, note).await
    }

    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError> {
        self.wait().await;
        self.inner.update_status_final(ticket, level, status).await
    }

    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.wait().await;
        self.inner.update_observation(ticket, level, note).await
    }
}

/// Gateway whose status update is slow and whose note update fails at once
#[derive(Default)]
struct SlowStatusGateway {
    inner: RecordingGateway,
    status_written: AtomicBool,
}

#[async_trait]
impl TicketGateway for SlowStatusGateway {
    async fn on_next_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.inner.on_next_level(ticket, new_level, note).await
    }

    async fn on_previous_level(
        &self,
        ticket: TicketId,
        new_level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.inner.on_previous_level(ticket, new_level, note).await
    }

    async fn update_status_final(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        status: LevelStatus,
    ) -> Result<(), GatewayError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.status_written.store(true, Ordering::SeqCst);
        self.inner.update_status_final(ticket, level, status).await
    }

    async fn update_observation(
        &self,
        ticket: TicketId,
        level: EscalationLevel,
        note: &str,
    ) -> Result<(), GatewayError> {
        self.inner.update_observation(ticket, level, note).await?;
        Err(GatewayError::request_failed("observation rejected"))
    }
}

/// Test: advancing from level 2 marks level 2 finished and opens level 3
#[tokio::test]
async fn test_advance_from_level_two() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(12345)), 2);

    let view = dialog.view();
    assert_eq!(view.countdown.display, "15:00");
    assert_eq!(view.countdown.severity, Severity::Normal);
    assert_eq!(view.header.title, "1ª Escalação");

    dialog.set_note(&format!("  {}\n", NOTE)).unwrap();
    let outcome = dialog.advance().await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Moved {
            from: level(2),
            to: level(3)
        }
    );
    assert_eq!(
        gateway.calls(),
        vec![
            GatewayCall::StatusFinal {
                ticket: TicketId(12345),
                key: "level2_status".to_string(),
                status: LevelStatus::Finished,
            },
            GatewayCall::Observation {
                ticket: TicketId(12345),
                level: level(2),
                note: NOTE.to_string(),
            },
            GatewayCall::NextLevel {
                ticket: TicketId(12345),
                level: level(3),
                note: NOTE.to_string(),
            },
        ]
    );
    assert_eq!(dialog.level(), level(3));
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
    assert_eq!(dialog.record().level_status(level(2)), LevelStatus::Finished);
    assert!(!dialog.is_open());
    assert_eq!(dialog.note(), "");

    let notice = notifier.last().unwrap();
    assert_eq!(notice.title, "🚀 2ª Escalação Iniciado");
    assert_eq!(notice.description, "Timer de 20 minutos iniciado para 2ª Escalação");
}

/// Test: a short note at level 5 is rejected without touching the gateway
#[tokio::test]
async fn test_short_note_rejected_at_last_level() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(7)), 5);
    dialog.set_note("curta").unwrap();

    let err = dialog.advance().await.unwrap_err();

    assert!(matches!(
        err,
        EscalationError::InvalidNote(NoteRejection::TooShort { length: 5 })
    ));
    assert!(gateway.calls().is_empty());
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
    assert!(dialog.is_open());

    let notice = notifier.last().unwrap();
    assert_eq!(notice.title, "⚠️ Observação Muito Curta");
    assert!(notice.is_destructive());
}

/// Test: a whitespace-only note counts as empty
#[tokio::test]
async fn test_blank_note_rejected() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(7)), 3);
    dialog.set_note("   \n\t ").unwrap();

    let err = dialog.finish().await.unwrap_err();
    assert!(matches!(
        err,
        EscalationError::InvalidNote(NoteRejection::Empty)
    ));
    assert!(gateway.calls().is_empty());
    assert_eq!(notifier.last().unwrap().title, "⚠️ Observação Obrigatória");
}

/// Test: advancing at the last level finalizes instead of moving
#[tokio::test]
async fn test_advance_at_last_level_finalizes() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(99)), 5);
    dialog.set_note(NOTE).unwrap();

    let outcome = dialog.advance().await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Finalized { level: level(5) });
    assert_eq!(dialog.level(), level(5));
    assert!(dialog.is_finalized());

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.contains(&GatewayCall::StatusFinal {
        ticket: TicketId(99),
        key: "level5_status".to_string(),
        status: LevelStatus::Finished,
    }));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, GatewayCall::NextLevel { .. })));

    let notice = notifier.last().unwrap();
    assert_eq!(notice.title, "✅ Chamado Finalizado");
    assert_eq!(notice.description, "Chamado 99 foi finalizado com sucesso!");
}

/// Test: finish resolves at the current level
#[tokio::test]
async fn test_finish_at_middle_level() {
    let (dialog, gateway, _) = open_dialog(TicketRecord::new(TicketId(3)), 3);
    dialog.set_note(NOTE).unwrap();

    let outcome = dialog.finish().await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Finalized { level: level(3) });
    assert!(dialog.is_finalized());
    assert_eq!(dialog.record().level_status(level(3)), LevelStatus::Finished);
    assert!(gateway.calls().contains(&GatewayCall::Observation {
        ticket: TicketId(3),
        level: level(3),
        note: NOTE.to_string(),
    }));
}

/// Test: retreat on a finalized ticket still goes through and stays finalized
#[tokio::test]
async fn test_retreat_while_finalized() {
    let record = TicketRecord::new(TicketId(5)).with_status(TicketStatus::Finished);
    let (dialog, gateway, notifier) = open_dialog(record, 3);
    assert!(dialog.is_finalized());

    dialog.set_note(NOTE).unwrap();
    let outcome = dialog.retreat().await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Moved {
            from: level(3),
            to: level(2)
        }
    );
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::PreviousLevel {
            ticket: TicketId(5),
            level: level(2),
            note: NOTE.to_string(),
        }]
    );
    assert!(dialog.is_finalized());
    assert_eq!(notifier.last().unwrap().title, "⬅️ Retornando para 1ª Escalação");
}

/// Test: advance and finish on a finalized ticket are refused
#[tokio::test]
async fn test_finalized_refuses_advance_and_finish() {
    let record = TicketRecord::new(TicketId(5)).with_level(level(4), LevelStatus::Finished);
    let (dialog, gateway, notifier) = open_dialog(record, 4);
    dialog.set_note(NOTE).unwrap();

    for action in [Action::Advance, Action::Finish] {
        let err = match action {
            Action::Advance => dialog.advance().await,
            _ => dialog.finish().await,
        }
        .unwrap_err();
        assert!(matches!(
            err,
            EscalationError::AlreadyFinalized {
                ticket: TicketId(5)
            }
        ));
    }

    assert!(gateway.calls().is_empty());
    assert_eq!(notifier.notices().len(), 2);
    assert_eq!(dialog.note(), NOTE);
}

/// Test: a gateway failure leaves level, lifecycle and note untouched
#[tokio::test]
async fn test_gateway_failure_keeps_state() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(8)), 2);
    gateway.fail_with(GatewayError::Unavailable("offline".to_string()));
    dialog.set_note(NOTE).unwrap();

    let err = dialog.advance().await.unwrap_err();

    assert!(matches!(err, EscalationError::Gateway(_)));
    assert!(err.is_recoverable());
    assert_eq!(dialog.level(), level(2));
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
    assert_eq!(dialog.record().level_status(level(2)), LevelStatus::Running);
    assert_eq!(dialog.note(), NOTE);
    assert!(dialog.is_open());
    assert!(!dialog.is_busy());
    assert_eq!(notifier.last().unwrap().title, "❌ Erro na Operação");

    // Recovery: the same note goes through once the gateway is back
    gateway.recover();
    gateway.clear();
    dialog.advance().await.unwrap();
    assert_eq!(dialog.level(), level(3));
    assert_eq!(gateway.calls().len(), 3);
}

/// Test: a failing note update does not cut the concurrent status update short
#[tokio::test]
async fn test_finish_failure_lets_sibling_call_complete() {
    let gateway = Arc::new(SlowStatusGateway::default());
    let notifier = RecordingNotifier::new();
    let dialog = EscalationDialog::open(
        DialogProps {
            ticket: TicketRecord::new(TicketId(31)),
            level: level(3),
            remaining_secs: 900,
        },
        gateway.clone(),
        Arc::new(notifier.clone()),
    );
    dialog.set_note(NOTE).unwrap();

    let err = dialog.finish().await.unwrap_err();

    assert!(matches!(err, EscalationError::Gateway(_)));
    assert!(gateway.status_written.load(Ordering::SeqCst));
    assert_eq!(gateway.inner.calls().len(), 2);
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
    assert_eq!(dialog.level(), level(3));
    assert_eq!(dialog.note(), NOTE);
    assert!(dialog.is_open());
    assert!(!dialog.is_busy());
    assert_eq!(notifier.last().unwrap().title, "❌ Erro na Operação");
}

/// Test: a failing backend at level 5 leaves the ticket active
#[tokio::test]
async fn test_advance_at_last_level_failure_keeps_state() {
    let (dialog, gateway, notifier) = open_dialog(TicketRecord::new(TicketId(32)), 5);
    gateway.fail_with(GatewayError::Unavailable("offline".to_string()));
    dialog.set_note(NOTE).unwrap();

    let err = dialog.advance().await.unwrap_err();

    assert!(matches!(err, EscalationError::Gateway(_)));
    assert_eq!(gateway.calls().len(), 2);
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
    assert_eq!(dialog.level(), level(5));
    assert_eq!(dialog.record().level_status(level(5)), LevelStatus::Running);
    assert_eq!(dialog.note(), NOTE);
    assert!(dialog.is_open());
    assert!(!dialog.is_busy());
    assert_eq!(notifier.last().unwrap().title, "❌ Erro na Operação");
}

/// Test: after advancing and retreating, the local record can be synced back
#[tokio::test]
async fn test_record_stays_consistent_after_retreat() {
    let (dialog, _, _) = open_dialog(TicketRecord::new(TicketId(33)), 2);

    dialog.set_note(NOTE).unwrap();
    dialog.advance().await.unwrap();
    assert_eq!(dialog.record().level_status(level(2)), LevelStatus::Finished);

    dialog.reopen();
    dialog.set_note(NOTE).unwrap();
    dialog.retreat().await.unwrap();

    let record = dialog.record();
    assert_eq!(dialog.level(), level(2));
    assert_eq!(record.level_status(level(2)), LevelStatus::Running);
    assert_eq!(record.lifecycle_at(level(2)), Lifecycle::Active);

    dialog.sync(record, dialog.level());
    assert_eq!(dialog.lifecycle(), Lifecycle::Active);
}

/// Test: a second action while one is in flight is refused
#[tokio::test]
async fn test_busy_rejects_concurrent_actions() {
    let inner = RecordingGateway::new();
    let release = Arc::new(Notify::new());
    let dialog = Arc::new(EscalationDialog::open(
        DialogProps {
            ticket: TicketRecord::new(TicketId(11)),
            level: level(2),
            remaining_secs: 900,
        },
        Arc::new(GatedGateway {
            inner: inner.clone(),
            release: release.clone(),
        }),
        Arc::new(RecordingNotifier::new()),
    ));
    dialog.set_note(NOTE).unwrap();

    let running = dialog.clone();
    let handle = tokio::spawn(async move { running.retreat().await });

    while !dialog.is_busy() {
        tokio::task::yield_now().await;
    }

    let view = dialog.view();
    assert!(view.processing);
    assert!(!view.note.editable);
    assert!(!view.actions.next.enabled);

    assert!(matches!(dialog.advance().await, Err(EscalationError::Busy)));
    assert!(matches!(dialog.set_note("outra nota"), Err(EscalationError::Busy)));

    release.notify_one();
    let outcome = handle.await.unwrap().unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Moved {
            from: level(2),
            to: level(1)
        }
    );
    assert!(!dialog.is_busy());
    assert_eq!(inner.calls().len(), 1);
}

/// Test: the bus sees started → completed → closed, and history counts them
#[tokio::test]
async fn test_events_published_on_bus() {
    let bus = EventBus::new().shared();
    let history = EventHistory::default();
    let mut receiver = bus.subscribe();

    let (dialog, _, _) = open_dialog(TicketRecord::new(TicketId(21)), 1);
    let dialog = dialog.with_events(bus.clone());

    dialog.set_note("curta").unwrap();
    let _ = dialog.advance().await;
    dialog.set_note(NOTE).unwrap();
    dialog.advance().await.unwrap();

    let mut types = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        assert_eq!(event.ticket(), TicketId(21));
        types.push(event.event_type());
        history.record(event);
    }
    assert_eq!(
        types,
        vec![
            "note_rejected",
            "transition_started",
            "transition_completed",
            "dialog_closed"
        ]
    );

    let stats = history.stats();
    assert_eq!(stats.rejected_notes, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.advances, 1);
    assert_eq!(stats.failed, 0);

    let completed = history
        .events()
        .into_iter()
        .find(|e| matches!(e, DialogEvent::TransitionCompleted { .. }))
        .unwrap();
    assert_eq!(completed.action(), Some(Action::Advance));
}

/// Test: loose host metadata drives the lifecycle
#[test]
fn test_loose_metadata_finalizes() {
    let value = serde_json::json!({
        "statusFinal": "finished",
        "level2_status": "running",
    });
    let record = TicketRecord::from_loose_json(TicketId(4), &value).unwrap();
    let (dialog, _, _) = open_dialog(record, 2);

    assert!(dialog.is_finalized());
    let view = dialog.view();
    assert_eq!(view.header.title, "Chamado Finalizado");
    assert!(!view.actions.previous.visible);
}

// ── Property: view flags follow state for every level ──────────────

#[test]
fn prop_view_controls_for_every_level_and_lifecycle() {
    for n in 1..=5u8 {
        for finished in [false, true] {
            let record = if finished {
                TicketRecord::new(TicketId(1)).with_level(level(n), LevelStatus::Finished)
            } else {
                TicketRecord::new(TicketId(1))
            };
            let (dialog, _, _) = open_dialog(record, n);
            dialog.set_note(NOTE).unwrap();
            let view = dialog.view();

            assert_eq!(view.actions.previous.visible, n > 1 && !finished);
            assert_eq!(view.actions.next.enabled, !finished);
            assert_eq!(view.actions.finish.enabled, !finished);
            assert_eq!(view.header.finalized, finished);
            assert_eq!(view.progress.caption, format!("Nível {} de 5", n));
        }
    }
}

// ── Property: countdown bands partition the timeline ───────────────

#[test]
fn prop_countdown_bands() {
    let (dialog, _, _) = open_dialog(TicketRecord::new(TicketId(1)), 1);

    for remaining in -5..=1300i64 {
        dialog.set_remaining(remaining);
        let countdown = dialog.view().countdown;

        let expected = if remaining <= 0 {
            Severity::Expired
        } else if remaining <= 300 {
            Severity::Critical
        } else if remaining <= 600 {
            Severity::Warning
        } else {
            Severity::Normal
        };
        assert_eq!(countdown.severity, expected, "remaining={}", remaining);
        assert!((0.0..=1.0).contains(&countdown.progress));
    }
}

// ── Property: note length boundaries ───────────────────────────────

#[tokio::test]
async fn prop_note_length_boundaries() {
    for len in [0usize, 1, 9, 10, 11, 500, 1000] {
        let (dialog, gateway, _) = open_dialog(TicketRecord::new(TicketId(1)), 5);
        dialog.set_note(&"é".repeat(len)).unwrap();

        let result = dialog.finish().await;
        if len >= 10 {
            assert!(result.is_ok(), "len={} should pass", len);
            assert_eq!(gateway.calls().len(), 2);
        } else {
            assert!(result.is_err(), "len={} should be rejected", len);
            assert!(gateway.calls().is_empty());
        }
    }
}

#[test]
fn prop_draft_is_capped() {
    let (dialog, _, _) = open_dialog(TicketRecord::new(TicketId(1)), 1);
    dialog.set_note(&"a".repeat(1500)).unwrap();
    assert_eq!(dialog.note().chars().count(), 1000);

    dialog.append_note("mais").unwrap();
    assert_eq!(dialog.note().chars().count(), 1000);
    assert_eq!(dialog.view().note.counter, "1000/1000 caracteres");
}
