//! Inbound line parser.
//!
//! Handles the small subset of the IRC message grammar the connector needs to
//! recognise `PING` keepalives and `PRIVMSG` chat lines. Tags are skipped, not
//! interpreted, and the source is reduced to the sender's nickname.

use thiserror::Error;

/// Errors produced while parsing a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed line: {0:?}")]
    MalformedLine(String),
}

/// A single parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Command verb, e.g. `PRIVMSG` or `PING`.
    pub command: String,
    /// Sender nickname, present only for `nick!user@host` sources.
    pub source: Option<String>,
    /// Trailing parameters after the first `:` following the command.
    pub parameters: Option<String>,
}

/// Parse one raw line (without its line terminator) into a [`ParsedMessage`].
///
/// Fails with [`ParseError::MalformedLine`] when no command token can be
/// extracted.
pub fn parse(raw: &str) -> Result<ParsedMessage, ParseError> {
    let malformed = || ParseError::MalformedLine(raw.to_string());
    let mut rest = raw;

    if rest.starts_with('@') {
        let (_, after) = rest.split_once(' ').ok_or_else(malformed)?;
        rest = after;
    }

    let mut source_component = None;
    if let Some(after_colon) = rest.strip_prefix(':') {
        let (source, after) = after_colon.split_once(' ').ok_or_else(malformed)?;
        source_component = Some(source);
        rest = after;
    }

    let (command_component, parameters) = match rest.split_once(':') {
        Some((command, params)) => (command, Some(params.trim().to_string())),
        None => (rest, None),
    };

    let command = command_component
        .split_whitespace()
        .next()
        .ok_or_else(malformed)?
        .to_string();

    Ok(ParsedMessage {
        command,
        source: source_component.and_then(sender_nick),
        parameters,
    })
}

fn sender_nick(source: &str) -> Option<String> {
    let mut parts = source.split('!');
    let nick = parts.next()?;
    match (parts.next(), parts.next()) {
        (Some(_), None) if !nick.is_empty() => Some(nick.to_string()),
        _ => None,
    }
}
