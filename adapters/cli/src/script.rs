//! Straight-line Karel programs: one command per line.

use karel_core::Command;
use thiserror::Error;

/// Marker that starts a comment running to the end of the line.
const COMMENT: char = '#';

/// Errors raised while reading a program script.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ScriptError {
    /// The line names no known command.
    #[error("line {line}: unknown command `{word}`")]
    UnknownCommand {
        /// 1-based script line.
        line: usize,
        /// Offending word.
        word: String,
    },
    /// The line holds more than one word.
    #[error("line {line}: expected a single command, found `{text}`")]
    TrailingInput {
        /// 1-based script line.
        line: usize,
        /// Offending line without its comment.
        text: String,
    },
}

/// Parses a script into the commands it runs, in order.
///
/// Names are case-insensitive and ignore underscores, so `turn_left`,
/// `TurnLeft` and `turnleft` are the same command. Blank lines and comments
/// are skipped. The whole script is checked before anything runs.
pub(crate) fn parse(source: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.split(COMMENT).next().unwrap_or_default().trim();
        let mut words = text.split_whitespace();
        let Some(word) = words.next() else {
            continue;
        };
        if words.next().is_some() {
            return Err(ScriptError::TrailingInput {
                line,
                text: text.to_owned(),
            });
        }
        let command = command_named(word).ok_or_else(|| ScriptError::UnknownCommand {
            line,
            word: word.to_owned(),
        })?;
        commands.push(command);
    }
    Ok(commands)
}

fn command_named(word: &str) -> Option<Command> {
    let normalized: String = word
        .chars()
        .filter(|character| *character != '_')
        .map(|character| character.to_ascii_lowercase())
        .collect();
    match normalized.as_str() {
        "move" | "moveforward" => Some(Command::Move),
        "turnleft" => Some(Command::TurnLeft),
        "putbeeper" => Some(Command::PutBeeper),
        "pickbeeper" => Some(Command::PickBeeper),
        "finish" => Some(Command::Finish),
        _ => None,
    }
}
