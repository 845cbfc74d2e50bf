//! Escalation levels: the five fixed support tiers
//!
//! ```text
//! 1  Primeiro Acionamento   initial contact and diagnosis
//! 2  1ª Escalação           specialised technical support
//! 3  2ª Escalação           senior specialists
//! 4  3ª Escalação           architecture team
//! 5  4ª Escalação           managers and technical decision makers
//! ```
//!
//! Advancing past level 5 is not a level change: it finalizes the ticket.

use serde::{Deserialize, Serialize};

use crate::error::EscalationError;

/// Lowest escalation level
pub const MIN_LEVEL: u8 = 1;

/// Highest escalation level; advancing from here finalizes the ticket
pub const MAX_LEVEL: u8 = 5;

/// An escalation level, always within `MIN_LEVEL..=MAX_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EscalationLevel(u8);

impl EscalationLevel {
    /// Initial contact
    pub const FIRST: Self = Self(MIN_LEVEL);
    /// Top escalation tier
    pub const LAST: Self = Self(MAX_LEVEL);

    /// Create a level, returning `None` outside 1..=5
    pub fn new(value: u8) -> Option<Self> {
        (MIN_LEVEL..=MAX_LEVEL).contains(&value).then_some(Self(value))
    }

    /// All levels in ascending order
    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        (MIN_LEVEL..=MAX_LEVEL).map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// The level above this one, if any
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// The level below this one, if any
    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).and_then(Self::new)
    }

    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    /// Key under which the host stores this level's status, e.g. `level2_status`
    pub fn status_key(self) -> String {
        format!("level{}_status", self.0)
    }

    /// Parse a status key back into a level
    pub fn from_status_key(key: &str) -> Option<Self> {
        key.strip_prefix("level")?
            .strip_suffix("_status")?
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
    }

    /// Fixed presentation metadata for this level
    pub fn info(self) -> &'static LevelInfo {
        &LEVEL_INFO[usize::from(self.0 - MIN_LEVEL)]
    }
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for EscalationLevel {
    type Error = EscalationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EscalationError::LevelOutOfRange {
            value: i64::from(value),
        })
    }
}

impl TryFrom<i64> for EscalationLevel {
    type Error = EscalationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(EscalationError::LevelOutOfRange { value })
    }
}

impl From<EscalationLevel> for u8 {
    fn from(level: EscalationLevel) -> Self {
        level.0
    }
}

/// Presentation metadata attached to each level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub title: &'static str,
    pub subtitle: &'static str,
    /// Label of the "next" action while at this level
    pub next_action: &'static str,
    pub description: &'static str,
    /// Label on the progress track
    pub progress_label: &'static str,
    pub short_label: &'static str,
}

const LEVEL_INFO: [LevelInfo; 5] = [
    LevelInfo {
        title: "Primeiro Acionamento",
        subtitle: "Atendimento inicial e diagnóstico",
        next_action: "Avançar para 1ª Escalação",
        description: "Primeiro contato e análise inicial do problema",
        progress_label: "1º Contato",
        short_label: "1º",
    },
    LevelInfo {
        title: "1ª Escalação",
        subtitle: "Suporte técnico especializado",
        next_action: "Avançar para 2ª Escalação",
        description: "Escalação para equipe técnica de primeiro nível",
        progress_label: "1ª Escalação",
        short_label: "1ª",
    },
    LevelInfo {
        title: "2ª Escalação",
        subtitle: "Especialistas sêniores",
        next_action: "Avançar para 3ª Escalação",
        description: "Escalação para especialistas técnicos sêniores",
        progress_label: "2ª Escalação",
        short_label: "2ª",
    },
    LevelInfo {
        title: "3ª Escalação",
        subtitle: "Time de arquitetura",
        next_action: "Avançar para 4ª Escalação",
        description: "Escalação para time de arquitetura e especialistas",
        progress_label: "3ª Escalação",
        short_label: "3ª",
    },
    LevelInfo {
        title: "4ª Escalação",
        subtitle: "Gestores e decisores técnicos",
        next_action: "Finalizar Chamado",
        description: "Escalação máxima - Gestores e decisores técnicos",
        progress_label: "4ª Escalação",
        short_label: "4ª",
    },
];
