//! Chat command dispatch.
//!
//! Turns a received chat line into a `(sender, verb, arguments)` call on the
//! first matching [`CommandSpec`]. The help verb is answered with one chat
//! line per registered command.

use crate::app::action::Action;
use crate::app::commands::{leading_token, split_arguments, CommandSpec};
use crate::app::event::ChatMessage;
use tracing::{debug, warn};

pub const DEFAULT_HELP_VERB: &str = "!help";

/// Ordered command table plus the reserved help verb.
#[derive(Debug)]
pub struct Dispatcher {
    commands: Vec<CommandSpec>,
    help_verb: String,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_HELP_VERB)
    }
}

impl Dispatcher {
    pub fn new(help_verb: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            help_verb: help_verb.into(),
        }
    }

    /// Append a command. Earlier registrations win on duplicate verbs.
    pub fn register(&mut self, spec: CommandSpec) -> &mut Self {
        self.commands.push(spec);
        self
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn help_verb(&self) -> &str {
        &self.help_verb
    }

    /// Rendered help listing, in registration order.
    pub fn help_lines(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }

    pub fn handle_message(&mut self, msg: &ChatMessage) -> Vec<Action> {
        self.on_message(&msg.sender, &msg.text)
    }

    /// Match `text` against the command table and run the handler.
    ///
    /// Returns the chat lines to send in reply, which is only non-empty for
    /// the help verb. Handler errors are logged and swallowed.
    pub fn on_message(&mut self, sender: &str, text: &str) -> Vec<Action> {
        let token = leading_token(text);
        let verb = token.to_lowercase();

        if verb == self.help_verb.to_lowercase() {
            debug!(sender, "listing {} commands", self.commands.len());
            return self
                .help_lines()
                .into_iter()
                .map(|text| Action::SendChat { text })
                .collect();
        }

        let Some(spec) = self
            .commands
            .iter_mut()
            .find(|spec| spec.verb.to_lowercase() == verb)
        else {
            return Vec::new();
        };

        let arguments = split_arguments(text, token);
        debug!(sender, verb = %spec.verb, ?arguments, "dispatching command");
        if let Err(e) = spec.invoke(sender, &arguments) {
            warn!(sender, verb = %spec.verb, "command failed: {}", e);
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::commands::CommandError;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<(String, String, Vec<String>)>>>;

    fn recording(verb: &str, label: &str, calls: &Calls) -> CommandSpec {
        let calls = calls.clone();
        let label = label.to_string();
        CommandSpec::new(verb, move |sender, args| {
            calls
                .lock()
                .unwrap()
                .push((label.clone(), sender.to_string(), args.to_vec()));
            Ok(())
        })
    }

    #[test]
    fn test_case_insensitive_match() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!red", "red", &calls));

        assert!(d.on_message("alice", "!Red").is_empty());
        assert!(d.on_message("bob", "!RED now").is_empty());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ("red".into(), "alice".into(), vec![]));
        assert_eq!(calls[1], ("red".into(), "bob".into(), vec!["now".to_string()]));
    }

    #[test]
    fn test_registered_verb_casing_is_ignored_for_matching() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!Blue", "blue", &calls));
        d.on_message("alice", "!blue");
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_first_registered_duplicate_wins() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!dup", "first", &calls));
        d.register(recording("!DUP", "second", &calls));

        d.on_message("alice", "!dup");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "first");
    }

    #[test]
    fn test_argument_splitting() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!color", "color", &calls));

        d.on_message("alice", "!color 1 0.5 0");
        d.on_message("alice", "!color");

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].2, vec!["1", "0.5", "0"]);
        assert!(calls[1].2.is_empty());
    }

    #[test]
    fn test_unmatched_and_prefix_lines_are_ignored() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!red", "red", &calls));

        assert!(d.on_message("alice", "hello there").is_empty());
        assert!(d.on_message("alice", "!redder").is_empty());
        assert!(d.on_message("alice", "say !red").is_empty());
        // Only a space ends the verb.
        assert!(d.on_message("alice", "!red\tnow").is_empty());
        assert!(d.on_message("alice", "").is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_help_lists_commands_in_order() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!red", "red", &calls).with_description("Turn the light red"));
        d.register(
            recording("!color", "color", &calls)
                .with_arguments("<r> <g> <b>")
                .with_description("Set an RGB colour"),
        );
        d.register(recording("!ping", "ping", &calls));

        let actions = d.on_message("alice", "!HELP");
        assert_eq!(
            actions,
            vec![
                Action::SendChat {
                    text: "!red - Turn the light red".into()
                },
                Action::SendChat {
                    text: "!color <r> <g> <b> - Set an RGB colour".into()
                },
                Action::SendChat {
                    text: "!ping".into()
                },
            ]
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_help_verb_is_configurable_and_shadows_commands() {
        let calls = Calls::default();
        let mut d = Dispatcher::new("!Commands");
        d.register(recording("!commands", "shadowed", &calls));

        assert_eq!(d.on_message("alice", "!commands").len(), 1);
        assert!(d.on_message("alice", "!help").is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handler_error_does_not_escape() {
        let mut d = Dispatcher::default();
        d.register(CommandSpec::new("!fail", |_, _| {
            Err(CommandError::InvalidArgument {
                name: "red",
                value: "abc".into(),
            })
        }));
        assert!(d.on_message("alice", "!fail abc").is_empty());
    }

    #[test]
    fn test_handle_message_uses_event_fields() {
        let calls = Calls::default();
        let mut d = Dispatcher::default();
        d.register(recording("!red", "red", &calls));
        d.handle_message(&ChatMessage {
            sender: "carol".into(),
            text: "!red".into(),
        });
        assert_eq!(calls.lock().unwrap()[0].1, "carol");
    }
}
