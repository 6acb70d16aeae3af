//! Chat command table entries.
//!
//! A [`CommandSpec`] binds a `!verb` to a handler callback plus the optional
//! argument/description text shown by the help listing.

use std::fmt;
use thiserror::Error;

/// Error a handler reports when it cannot act on its arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("expected at least {expected} arguments, got {got}")]
    MissingArguments { expected: usize, got: usize },
    #[error("invalid {name}: {value:?}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("{0}")]
    Failed(String),
}

/// Callback invoked with `(sender, arguments)` when a command matches.
pub type CommandHandler = Box<dyn FnMut(&str, &[String]) -> Result<(), CommandError> + Send>;

/// One registered chat command.
pub struct CommandSpec {
    /// Verb as typed in chat, e.g. `!color`. Matched case-insensitively.
    pub verb: String,
    /// Argument hint, e.g. `<r> <g> <b>`.
    pub argument_description: Option<String>,
    pub description: Option<String>,
    handler: CommandHandler,
}

impl CommandSpec {
    pub fn new<F>(verb: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&str, &[String]) -> Result<(), CommandError> + Send + 'static,
    {
        Self {
            verb: verb.into(),
            argument_description: None,
            description: None,
            handler: Box::new(handler),
        }
    }

    pub fn with_arguments(mut self, argument_description: impl Into<String>) -> Self {
        self.argument_description = Some(argument_description.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn invoke(&mut self, sender: &str, arguments: &[String]) -> Result<(), CommandError> {
        (self.handler)(sender, arguments)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("verb", &self.verb)
            .field("argument_description", &self.argument_description)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Renders the help line: `<verb>[ <arguments>][ - <description>]`.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        if let Some(args) = self.argument_description.as_deref().filter(|s| !s.is_empty()) {
            write!(f, " {}", args)?;
        }
        if let Some(desc) = self.description.as_deref().filter(|s| !s.is_empty()) {
            write!(f, " - {}", desc)?;
        }
        Ok(())
    }
}

/// The text before the first space of a chat line, as typed. Only a plain
/// space separates the verb, matching how arguments are split.
pub fn leading_token(text: &str) -> &str {
    text.split(' ').next().unwrap_or("")
}

/// Arguments following `token` and its separator, split on single spaces.
///
/// `token` must be a prefix of `text`. Consecutive spaces yield empty
/// arguments; a line with nothing after the separator yields none.
pub fn split_arguments(text: &str, token: &str) -> Vec<String> {
    let mut rest = text[token.len()..].chars();
    rest.next();
    let remainder = rest.as_str();
    if remainder.is_empty() {
        return Vec::new();
    }
    remainder.split(' ').map(str::to_string).collect()
}
