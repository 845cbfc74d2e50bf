//! End-to-end flow through the console host pieces
//!
//! Config → dialog props → dialog over the console gateway → rendered text.

use std::sync::Arc;

use escalation::{EscalationDialog, GatewayCall, LevelStatus, RecordingNotifier, TicketId};
use escalation_console::{render, Command, ConsoleConfig, ConsoleGateway};

fn config(level: i64, finished: bool) -> ConsoleConfig {
    ConsoleConfig {
        ticket: 12345,
        level,
        remaining_secs: 900,
        finished,
        fail_gateway: false,
        tick_ms: 1000,
    }
}

/// Test: the demo scenario moves level 2 to level 3 and restarts the timer
#[tokio::test]
async fn test_demo_scenario_advances() {
    let props = config(2, false).dialog_props().unwrap();
    let (gateway, mut level_changes) = ConsoleGateway::new();
    let dialog = EscalationDialog::open(
        props,
        Arc::new(gateway.clone()),
        Arc::new(RecordingNotifier::new()),
    );

    let rendered = render(&dialog.view());
    assert!(rendered.contains("Chamado #12345"));
    assert!(rendered.contains("15:00"));
    assert!(rendered.contains("Nível 2 de 5"));

    match Command::parse("note Diagnóstico concluído").unwrap() {
        Some(Command::Note(text)) => dialog.set_note(&text).unwrap(),
        other => panic!("unexpected command: {:?}", other),
    }
    dialog.advance().await.unwrap();

    assert_eq!(level_changes.try_recv().unwrap().get(), 3);
    assert_eq!(
        gateway.calls()[0],
        GatewayCall::StatusFinal {
            ticket: TicketId(12345),
            key: "level2_status".to_string(),
            status: LevelStatus::Finished,
        }
    );
    assert!(render(&dialog.view()).contains("Nível 3 de 5"));
}

/// Test: a finished ticket renders finalized and hides the retreat control
#[tokio::test]
async fn test_finished_ticket_renders_finalized() {
    let props = config(3, true).dialog_props().unwrap();
    let (gateway, _) = ConsoleGateway::new();
    let dialog = EscalationDialog::open(
        props,
        Arc::new(gateway),
        Arc::new(RecordingNotifier::new()),
    );

    let rendered = render(&dialog.view());
    assert!(rendered.contains("Chamado Finalizado"));
    assert!(rendered.contains("Finalizado"));
    assert!(!rendered.contains("[retreat:"));
}

/// Test: a failing backend leaves the dialog where it was
#[tokio::test]
async fn test_failing_backend_keeps_level() {
    let props = config(4, false).dialog_props().unwrap();
    let (gateway, mut level_changes) = ConsoleGateway::new();
    gateway.fail_with(escalation::GatewayError::Unavailable("offline".into()));
    let notifier = RecordingNotifier::new();
    let dialog = EscalationDialog::open(
        props,
        Arc::new(gateway.clone()),
        Arc::new(notifier.clone()),
    );

    dialog.set_note("Reinício do serviço sem efeito").unwrap();
    assert!(dialog.retreat().await.is_err());

    assert_eq!(dialog.level().get(), 4);
    assert!(level_changes.try_recv().is_err());
    assert_eq!(notifier.last().unwrap().title, "❌ Erro na Operação");
    assert_eq!(gateway.calls().len(), 1);
}
