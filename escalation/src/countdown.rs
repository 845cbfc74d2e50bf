//! Countdown presentation
//!
//! Maps a remaining-seconds value to a severity band. The dialog owns no
//! timer: the host decrements the value and pushes it in.
//!
//! ```text
//!   remaining ≤ 0      expired
//!   0 < r ≤ 300        critical
//!   300 < r ≤ 600      warning
//!   r > 600            normal
//! ```

use serde::{Deserialize, Serialize};

/// Full duration of one escalation level (20 minutes)
pub const FULL_DURATION_SECS: i64 = 1200;

/// Upper bound of the critical band (5 minutes)
pub const CRITICAL_THRESHOLD_SECS: i64 = 300;

/// Upper bound of the warning band (10 minutes)
pub const WARNING_THRESHOLD_SECS: i64 = 600;

/// Severity band of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
    Expired,
}

impl Severity {
    /// Classify a remaining-seconds value
    pub fn from_remaining(remaining_secs: i64) -> Self {
        if remaining_secs <= 0 {
            Self::Expired
        } else if remaining_secs <= CRITICAL_THRESHOLD_SECS {
            Self::Critical
        } else if remaining_secs <= WARNING_THRESHOLD_SECS {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Expired => "Tempo Esgotado",
            Self::Critical => "Crítico",
            Self::Warning => "Atenção",
            Self::Normal => "Normal",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Expired => "⏰ Timer Expirado",
            Self::Critical => "🚨 Tempo Crítico",
            Self::Warning => "⚠️ Atenção ao Tempo",
            Self::Normal => "⏳ Tempo Normal",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Expired | Self::Critical => Tone::Destructive,
            Self::Warning => Tone::Warning,
            Self::Normal => Tone::Primary,
        }
    }

    /// Critical and expired countdowns get the pulsing highlight
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Critical | Self::Expired)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Colour family a front end should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Primary,
    Warning,
    Destructive,
}

/// Renders a countdown value; the `formatTime` callback of the host
pub trait TimeFormatter: Send + Sync {
    fn format(&self, seconds: u64) -> String;
}

impl<F> TimeFormatter for F
where
    F: Fn(u64) -> String + Send + Sync,
{
    fn format(&self, seconds: u64) -> String {
        self(seconds)
    }
}

/// `MM:SS`, minutes not wrapped at the hour
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockFormatter;

impl TimeFormatter for ClockFormatter {
    fn format(&self, seconds: u64) -> String {
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Everything a front end needs to draw the countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownView {
    pub remaining_secs: i64,
    pub severity: Severity,
    pub status_label: String,
    pub badge: String,
    pub tone: Tone,
    pub highlight: bool,
    /// Formatted remaining time, never negative
    pub display: String,
    /// Fill fraction of the depleting bar, in `[0, 1]`
    pub progress: f64,
    pub start_label: String,
    pub end_label: String,
}

impl CountdownView {
    /// Present a remaining-seconds value with the host's formatter
    pub fn present(remaining_secs: i64, formatter: &dyn TimeFormatter) -> Self {
        let severity = Severity::from_remaining(remaining_secs);
        let shown = u64::try_from(remaining_secs.max(0)).unwrap_or(0);

        Self {
            remaining_secs,
            severity,
            status_label: severity.status_label().to_string(),
            badge: severity.badge().to_string(),
            tone: severity.tone(),
            highlight: severity.is_urgent(),
            display: formatter.format(shown),
            progress: progress_fraction(remaining_secs),
            start_label: "0:00".to_string(),
            end_label: "20:00".to_string(),
        }
    }
}

/// `clamp(remaining / 1200, 0, 1)`
pub fn progress_fraction(remaining_secs: i64) -> f64 {
    (remaining_secs as f64 / FULL_DURATION_SECS as f64).clamp(0.0, 1.0)
}
