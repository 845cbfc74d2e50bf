//! Plain-text rendering of a [`DialogView`]

use std::fmt::Write;

use escalation::{ActionControl, DialogView, Notice, Notifier, StepState, TracingNotifier};

const BAR_WIDTH: usize = 20;

pub fn render(view: &DialogView) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_view(&mut out, view);
    out
}

fn write_view(out: &mut String, view: &DialogView) -> std::fmt::Result {
    let header = &view.header;
    writeln!(out, "┌─ {} · {}", header.ticket_badge, header.status_badge)?;
    writeln!(out, "│ {}: {}", header.title, header.subtitle)?;
    writeln!(out, "│ {}", header.description)?;
    if !view.open {
        writeln!(out, "│ (fechado, use `open`)")?;
    }

    let countdown = &view.countdown;
    writeln!(
        out,
        "│ {} {} [{}] {}  {}",
        countdown.badge,
        countdown.display,
        bar(countdown.progress),
        countdown.status_label,
        if countdown.highlight { "!" } else { "" },
    )?;

    let steps: Vec<String> = view
        .progress
        .steps
        .iter()
        .map(|step| {
            let mark = match step.state {
                StepState::Completed => "✓",
                StepState::Active => "●",
                StepState::Pending => "○",
            };
            format!("{} {}", mark, step.short_label)
        })
        .collect();
    writeln!(out, "│ {}  {}", view.progress.caption, steps.join("  "))?;

    let note = &view.note;
    if note.text.is_empty() {
        writeln!(out, "│ observação: (vazia)")?;
    } else {
        writeln!(out, "│ observação: {}", note.text)?;
    }
    writeln!(
        out,
        "│ {}{}{}",
        note.counter,
        if note.near_limit { " (perto do limite)" } else { "" },
        note.valid_label
            .as_deref()
            .map(|label| format!(" · {}", label))
            .unwrap_or_default(),
    )?;

    let actions = [
        ("retreat", &view.actions.previous),
        ("finish", &view.actions.finish),
        ("advance", &view.actions.next),
    ];
    let rendered: Vec<String> = actions
        .iter()
        .filter(|(_, control)| control.visible)
        .map(|(command, control)| action(command, control))
        .collect();
    writeln!(out, "│ {}", rendered.join("  "))?;

    if view.processing {
        writeln!(out, "│ {}", view.processing_label)?;
    }
    write!(out, "└─")
}

fn action(command: &str, control: &ActionControl) -> String {
    let state = if control.enabled { "" } else { " (indisponível)" };
    format!("[{}: {}{}]", command, control.label, state)
}

fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn render_notice(notice: &Notice) -> String {
    format!("» {}: {}", notice.title, notice.description)
}

/// Prints notices as toasts and forwards them to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", render_notice(&notice));
        TracingNotifier.notify(notice);
    }
}
