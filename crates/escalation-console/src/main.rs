use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use escalation::countdown::FULL_DURATION_SECS;
use escalation::{EscalationDialog, EventBus, EventHistory, GatewayError};
use escalation_console::commands::HELP;
use escalation_console::{render, Args, Command, ConsoleConfig, ConsoleGateway, ConsoleNotifier};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ConsoleConfig::from_args(Args::parse());
    let props = config
        .dialog_props()
        .context("Invalid escalation settings")?;
    info!(
        ticket = %props.ticket.id,
        level = %props.level,
        remaining_secs = props.remaining_secs,
        fail_gateway = config.fail_gateway,
        "Escalation console starting"
    );

    let (gateway, mut level_changes) = ConsoleGateway::new();
    if config.fail_gateway {
        gateway.fail_with(GatewayError::Unavailable(
            "backend disabled by --fail-gateway".into(),
        ));
    }

    let bus = EventBus::new().shared();
    let history = EventHistory::default();
    let history_task = history.attach(&bus);

    let mut remaining = props.remaining_secs;
    let dialog = EscalationDialog::open(
        props,
        Arc::new(gateway.clone()),
        Arc::new(ConsoleNotifier),
    )
    .with_events(bus.clone());

    println!("{}", render(&dialog.view()));
    println!("{}", HELP);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if remaining > 0 {
                    remaining -= 1;
                    dialog.set_remaining(remaining);
                    if remaining == 0 {
                        warn!(
                            ticket = %dialog.ticket(),
                            level = %dialog.level(),
                            "Level timer expired"
                        );
                    }
                }
            }
            Some(level) = level_changes.recv() => {
                remaining = FULL_DURATION_SECS;
                dialog.set_remaining(remaining);
                info!(%level, remaining_secs = remaining, "Level timer restarted");
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        if execute(&dialog, command).await?.is_break() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => println!("{}", err),
                }
            }
        }
    }

    dialog.close();
    drop(dialog);
    drop(bus);
    history_task.await.context("Event history task failed")?;

    let stats = history.stats();
    info!(
        events = stats.total_events,
        completed = stats.completed,
        failed = stats.failed,
        rejected_notes = stats.rejected_notes,
        gateway_calls = gateway.calls().len(),
        "Escalation console stopped"
    );

    Ok(())
}

async fn execute(dialog: &EscalationDialog, command: Command) -> Result<ControlFlow<()>> {
    match command {
        Command::Note(text) => {
            if let Err(err) = dialog.set_note(&text) {
                println!("{}", err);
            }
        }
        Command::Append(text) => {
            let separator = if dialog.note().is_empty() { "" } else { "\n" };
            if let Err(err) = dialog.append_note(&format!("{}{}", separator, text)) {
                println!("{}", err);
            }
        }
        Command::Advance | Command::Retreat | Command::Finish => {
            if !dialog.is_open() {
                println!("Diálogo fechado, use `open`.");
                return Ok(ControlFlow::Continue(()));
            }
            let result = match command {
                Command::Advance => dialog.advance().await,
                Command::Retreat => dialog.retreat().await,
                _ => dialog.finish().await,
            };
            match result {
                Ok(outcome) => debug!(?outcome, "Transition finished"),
                // Notices were already shown
                Err(err) => debug!(%err, "Transition not applied"),
            }
            println!("{}", render(&dialog.view()));
        }
        Command::View { json: true } => {
            let view = serde_json::to_string_pretty(&dialog.view())
                .context("Failed to serialize dialog view")?;
            println!("{}", view);
        }
        Command::View { json: false } => println!("{}", render(&dialog.view())),
        Command::Open => {
            dialog.reopen();
            println!("{}", render(&dialog.view()));
        }
        Command::Close => dialog.close(),
        Command::Help => println!("{}", HELP),
        Command::Quit => return Ok(ControlFlow::Break(())),
    }
    Ok(ControlFlow::Continue(()))
}
