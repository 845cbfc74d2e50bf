//! Terminal host for the escalation dialog
//!
//! Plays the role a web page plays around the dialog: it owns the countdown,
//! supplies the ticket backend and shows notices.

pub mod commands;
pub mod config;
pub mod gateway;
pub mod render;

pub use commands::{Command, CommandError};
pub use config::{Args, ConsoleConfig};
pub use gateway::ConsoleGateway;
pub use render::{render, ConsoleNotifier};
