//! Chamado Escalation Library
//!
//! Headless escalation dialog for support tickets ("chamados"). A ticket is
//! walked through five fixed escalation levels; every move requires an
//! observation note, and a host-owned countdown is shown in severity bands.
//!
//! # Pieces
//!
//! - [`machine`]: level 1–5 plus lifecycle, two-phase transitions
//! - [`note`]: note validation and the capped draft
//! - [`countdown`]: remaining seconds → normal / warning / critical / expired
//! - [`dialog`]: the controller that runs transitions against the host's ports
//! - [`view`]: render-ready projection of the dialog
//! - [`ports`] and [`notify`]: what the host plugs in
//! - [`events`]: broadcast of dialog events and a bounded history
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use escalation::{
//!     DialogProps, EscalationDialog, EscalationLevel, RecordingGateway, TicketId,
//!     TicketRecord, TracingNotifier,
//! };
//!
//! # async fn demo() -> escalation::EscalationResult<()> {
//! let dialog = EscalationDialog::open(
//!     DialogProps {
//!         ticket: TicketRecord::new(TicketId(12345)),
//!         level: EscalationLevel::new(2).expect("valid level"),
//!         remaining_secs: 900,
//!     },
//!     Arc::new(RecordingGateway::new()),
//!     Arc::new(TracingNotifier),
//! );
//! dialog.set_note("Diagnóstico concluído")?;
//! dialog.advance().await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod countdown;
pub mod dialog;
pub mod error;
pub mod events;
pub mod level;
pub mod machine;
pub mod note;
pub mod notify;
pub mod ports;
pub mod ticket;
pub mod view;

pub use countdown::{ClockFormatter, CountdownView, Severity, TimeFormatter, Tone};
pub use dialog::{DialogProps, EscalationDialog, TransitionOutcome};
pub use error::{EscalationError, EscalationResult, GatewayError};
pub use events::{DialogEvent, EventBus, EventFilter, EventHistory, SharedEventBus};
pub use level::{EscalationLevel, LevelInfo};
pub use machine::{Action, EscalationMachine, TransitionPlan, TransitionRecord};
pub use note::{validate, NoteDraft, NoteRejection, ValidNote};
pub use notify::{Notice, NoticeVariant, Notifier, RecordingNotifier, TracingNotifier};
pub use ports::{GatewayCall, RecordingGateway, TicketGateway};
pub use ticket::{Lifecycle, LevelStatus, TicketId, TicketRecord, TicketStatus};
pub use view::{ActionControl, DialogView, StepState};
