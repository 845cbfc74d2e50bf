//! Stdin command parsing

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the note draft
    Note(String),
    /// Append a line to the note draft
    Append(String),
    Advance,
    Retreat,
    Finish,
    View { json: bool },
    Open,
    Close,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("`{0}` needs text")]
    MissingText(&'static str),
}

pub const HELP: &str = "\
comandos:
  note <texto>     substitui a observação
  append <texto>   acrescenta uma linha à observação
  advance          avança para o próximo nível (ou conclui no nível 5)
  retreat          volta um nível
  finish           resolve o chamado agora
  view [--json]    mostra o diálogo
  open | close     abre ou fecha o diálogo
  quit             sai";

impl Command {
    /// Parse one input line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "note" => Self::Note(rest.to_string()),
            "append" if rest.is_empty() => return Err(CommandError::MissingText("append")),
            "append" => Self::Append(rest.to_string()),
            "advance" | "next" => Self::Advance,
            "retreat" | "back" => Self::Retreat,
            "finish" => Self::Finish,
            "view" => Self::View {
                json: rest == "--json",
            },
            "open" => Self::Open,
            "close" => Self::Close,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_keeps_text() {
        assert_eq!(
            Command::parse("note   Diagnóstico concluído ").unwrap(),
            Some(Command::Note("Diagnóstico concluído".to_string()))
        );
        // An empty note is allowed; validation happens on the transition
        assert_eq!(
            Command::parse("note").unwrap(),
            Some(Command::Note(String::new()))
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("advance").unwrap(), Some(Command::Advance));
        assert_eq!(Command::parse("back").unwrap(), Some(Command::Retreat));
        assert_eq!(
            Command::parse("view --json").unwrap(),
            Some(Command::View { json: true })
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("escalate"),
            Err(CommandError::Unknown("escalate".to_string()))
        );
        assert_eq!(
            Command::parse("append"),
            Err(CommandError::MissingText("append"))
        );
    }
}
