//! Ticket record: the structured replacement for the host's loose metadata
//!
//! Hosts historically handed the dialog an arbitrary JSON object such as
//! `{"statusFinal": "running", "level2_status": "finished"}`. [`TicketRecord`]
//! gives that data a shape: one overall status plus a status per level.
//! The dialog reads it once through [`TicketRecord::lifecycle_at`] and from
//! then on trusts only the machine's [`Lifecycle`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EscalationError, EscalationResult};
use crate::level::EscalationLevel;

/// Key holding the overall ticket status in the loose metadata
pub const OVERALL_STATUS_KEY: &str = "statusFinal";

/// Numeric ticket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Overall ticket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Running,
    Finished,
}

/// Status of a single escalation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    #[default]
    Running,
    Finished,
}

impl LevelStatus {
    /// Wire value sent to the gateway
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative lifecycle of the ticket as seen by the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Finalized,
}

impl Lifecycle {
    pub fn is_finalized(self) -> bool {
        self == Self::Finalized
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// Structured ticket metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub id: TicketId,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub levels: BTreeMap<EscalationLevel, LevelStatus>,
}

impl TicketRecord {
    /// A running ticket with no level statuses recorded yet
    pub fn new(id: TicketId) -> Self {
        Self {
            id,
            status: TicketStatus::Running,
            levels: BTreeMap::new(),
        }
    }

    /// Builder-style setter for a level status
    pub fn with_level(mut self, level: EscalationLevel, status: LevelStatus) -> Self {
        self.levels.insert(level, status);
        self
    }

    /// Builder-style setter for the overall status
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    /// Status recorded for a level; unrecorded levels count as running
    pub fn level_status(&self, level: EscalationLevel) -> LevelStatus {
        self.levels.get(&level).copied().unwrap_or_default()
    }

    pub fn set_level_status(&mut self, level: EscalationLevel, status: LevelStatus) {
        self.levels.insert(level, status);
    }

    /// Derive the lifecycle for the dialog opened at `level`
    ///
    /// Finalized when the ticket as a whole is finished or when the level the
    /// dialog is opened at is finished.
    pub fn lifecycle_at(&self, level: EscalationLevel) -> Lifecycle {
        if self.status == TicketStatus::Finished
            || self.level_status(level) == LevelStatus::Finished
        {
            Lifecycle::Finalized
        } else {
            Lifecycle::Active
        }
    }

    /// Parse the loose host metadata (`statusFinal`, `level{N}_status`)
    ///
    /// Unknown keys are ignored. A missing object yields a running ticket,
    /// matching hosts that open the dialog without any metadata.
    pub fn from_loose_json(id: TicketId, value: &serde_json::Value) -> EscalationResult<Self> {
        let mut record = Self::new(id);

        let object = match value {
            serde_json::Value::Null => return Ok(record),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(EscalationError::invalid_ticket_data(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        for (key, raw) in object {
            if key == OVERALL_STATUS_KEY {
                record.status = match parse_status(key, raw)? {
                    LevelStatus::Finished => TicketStatus::Finished,
                    LevelStatus::Running => TicketStatus::Running,
                };
            } else if let Some(level) = EscalationLevel::from_status_key(key) {
                record.levels.insert(level, parse_status(key, raw)?);
            }
        }

        Ok(record)
    }
}

/// Only "finished" is meaningful; any other string reads as running
fn parse_status(key: &str, raw: &serde_json::Value) -> EscalationResult<LevelStatus> {
    match raw {
        serde_json::Value::String(s) if s == "finished" => Ok(LevelStatus::Finished),
        serde_json::Value::String(_) | serde_json::Value::Null => Ok(LevelStatus::Running),
        other => Err(EscalationError::invalid_ticket_data(format!(
            "{} must be a string, got {}",
            key, other
        ))),
    }
}
