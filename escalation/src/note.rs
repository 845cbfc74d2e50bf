//! Observation note validation and the editable draft
//!
//! Every transition must carry a note of at least [`MIN_NOTE_CHARS`]
//! characters after trimming. Lengths are counted in Unicode scalar values,
//! so "Diagnóstico" is eleven characters, not twelve bytes.

use serde::{Deserialize, Serialize};

use crate::notify::Notice;

/// Minimum trimmed length for a note to be accepted
pub const MIN_NOTE_CHARS: usize = 10;

/// Maximum note length; the draft truncates input beyond this
pub const MAX_NOTE_CHARS: usize = 1000;

/// Above this length the character counter is highlighted
pub const NOTE_WARNING_CHARS: usize = 900;

/// Why a note was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoteRejection {
    /// Nothing but whitespace
    Empty,
    /// Fewer than [`MIN_NOTE_CHARS`] characters after trimming
    TooShort { length: usize },
    /// More than [`MAX_NOTE_CHARS`] characters after trimming
    TooLong { length: usize },
}

impl NoteRejection {
    /// Inline notice shown to the user
    pub fn notice(&self) -> Notice {
        match self {
            Self::Empty => Notice::destructive(
                "⚠️ Observação Obrigatória",
                "É obrigatório preencher o campo de observações para continuar",
            ),
            Self::TooShort { .. } => Notice::destructive(
                "⚠️ Observação Muito Curta",
                format!("A observação deve ter pelo menos {} caracteres", MIN_NOTE_CHARS),
            ),
            Self::TooLong { .. } => Notice::destructive(
                "⚠️ Observação Muito Longa",
                format!("A observação deve ter no máximo {} caracteres", MAX_NOTE_CHARS),
            ),
        }
    }
}

impl std::fmt::Display for NoteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "note is empty"),
            Self::TooShort { length } => {
                write!(f, "note has {} characters (minimum {})", length, MIN_NOTE_CHARS)
            }
            Self::TooLong { length } => {
                write!(f, "note has {} characters (maximum {})", length, MAX_NOTE_CHARS)
            }
        }
    }
}

impl std::error::Error for NoteRejection {}

/// A note that passed validation, already trimmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidNote(String);

impl ValidNote {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ValidNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a note independently of level and lifecycle
pub fn validate(note: &str) -> Result<ValidNote, NoteRejection> {
    let trimmed = note.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        Err(NoteRejection::Empty)
    } else if length < MIN_NOTE_CHARS {
        Err(NoteRejection::TooShort { length })
    } else if length > MAX_NOTE_CHARS {
        Err(NoteRejection::TooLong { length })
    } else {
        Ok(ValidNote(trimmed.to_string()))
    }
}

/// Editable note text, capped at [`MAX_NOTE_CHARS`] characters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    text: String,
}

impl NoteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft, truncating at the character cap
    pub fn set(&mut self, text: &str) {
        self.text = truncate_chars(text, MAX_NOTE_CHARS).to_string();
    }

    /// Append text, dropping whatever would exceed the cap
    pub fn push_str(&mut self, text: &str) {
        let room = MAX_NOTE_CHARS.saturating_sub(self.char_count());
        self.text.push_str(truncate_chars(text, room));
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Untrimmed length, as shown by the counter
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_near_limit(&self) -> bool {
        self.char_count() > NOTE_WARNING_CHARS
    }

    pub fn is_valid(&self) -> bool {
        validate(&self.text).is_ok()
    }

    pub fn validate(&self) -> Result<ValidNote, NoteRejection> {
        validate(&self.text)
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
