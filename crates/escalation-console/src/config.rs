use clap::Parser;
use escalation::{DialogProps, EscalationLevel, EscalationResult, TicketId, TicketRecord};
use serde_json::json;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Ticket number (overrides ESCALATION_TICKET)
    #[arg(long)]
    pub ticket: Option<u64>,

    /// Current escalation level, 1 to 5 (overrides ESCALATION_LEVEL)
    #[arg(long)]
    pub level: Option<i64>,

    /// Seconds left on the level timer (overrides ESCALATION_REMAINING)
    #[arg(long)]
    pub remaining: Option<i64>,

    /// Open the dialog on a ticket that is already finished
    #[arg(long, default_value_t = false)]
    pub finished: bool,

    /// Make every gateway call fail
    #[arg(long, default_value_t = false)]
    pub fail_gateway: bool,

    /// Countdown tick in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,
}

/// Demo host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub ticket: u64,
    /// Raw level as given; checked when the dialog props are built
    pub level: i64,
    pub remaining_secs: i64,
    pub finished: bool,
    pub fail_gateway: bool,
    pub tick_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            ticket: env_or("ESCALATION_TICKET", 12345),
            level: env_or("ESCALATION_LEVEL", 2),
            remaining_secs: env_or("ESCALATION_REMAINING", 900),
            finished: false,
            fail_gateway: false,
            tick_ms: 1000,
        }
    }
}

impl ConsoleConfig {
    /// Environment defaults with command-line overrides applied
    pub fn from_args(args: Args) -> Self {
        let mut config = Self::default();
        if let Some(ticket) = args.ticket {
            config.ticket = ticket;
        }
        if let Some(level) = args.level {
            config.level = level;
        }
        if let Some(remaining) = args.remaining {
            config.remaining_secs = remaining;
        }
        config.finished = args.finished;
        config.fail_gateway = args.fail_gateway;
        config.tick_ms = args.tick_ms.max(1);
        config
    }

    /// Loose metadata in the shape web hosts send (`statusFinal`, `levelN_status`)
    pub fn metadata(&self) -> serde_json::Value {
        let status = if self.finished { "finished" } else { "running" };
        let mut metadata = serde_json::Map::new();
        metadata.insert("statusFinal".to_string(), json!(status));
        metadata.insert(format!("level{}_status", self.level), json!("running"));
        serde_json::Value::Object(metadata)
    }

    pub fn dialog_props(&self) -> EscalationResult<DialogProps> {
        let level = EscalationLevel::try_from(self.level)?;
        let ticket = TicketRecord::from_loose_json(TicketId(self.ticket), &self.metadata())?;
        Ok(DialogProps {
            ticket,
            level,
            remaining_secs: self.remaining_secs,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use escalation::{EscalationError, Lifecycle};

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

    #[test]
    fn test_args_override_defaults() {
        let args = Args::parse_from([
            "escalation-console",
            "--ticket",
            "77",
            "--level",
            "4",
            "--finished",
            "--tick-ms",
            "0",
        ]);
        let config = ConsoleConfig::from_args(args);
        assert_eq!(config.ticket, 77);
        assert_eq!(config.level, 4);
        assert!(config.finished);
        assert!(!config.fail_gateway);
        assert_eq!(config.tick_ms, 1);
    }

    #[test]
    fn test_dialog_props_from_config() {
        let props = config(2, false).dialog_props().unwrap();
        assert_eq!(props.ticket.id, TicketId(12345));
        assert_eq!(props.level.get(), 2);
        assert_eq!(props.ticket.lifecycle_at(props.level), Lifecycle::Active);

        let props = config(3, true).dialog_props().unwrap();
        assert_eq!(props.ticket.lifecycle_at(props.level), Lifecycle::Finalized);
    }

    #[test]
    fn test_level_out_of_range() {
        let err = config(9, false).dialog_props().unwrap_err();
        assert!(matches!(err, EscalationError::LevelOutOfRange { value: 9 }));
    }
}
