//! Twitch-style chat connector with `!command` dispatch.
//!
//! A [`Connector`] logs in to one channel, answers keepalives, and publishes
//! received chat lines to subscribers. A [`Dispatcher`] subscribed to it maps
//! `!verb arg arg` lines onto registered [`CommandSpec`] handlers.

pub mod app;
pub mod config;
pub mod irc;
pub mod logging;

pub use app::action::Action;
pub use app::commands::{CommandError, CommandSpec};
pub use app::event::{ChatMessage, SubscriptionId};
pub use app::handler::Dispatcher;
pub use irc::connection::{ConnectionState, Connector, ConnectorError, StepOutcome};
pub use irc::manager::ConnectorRegistry;
pub use irc::parser::{parse, ParseError, ParsedMessage};
