//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so an empty file (or no file) yields a working
//! anonymous read-only connection once a channel is set.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat service endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login name. Empty means anonymous (read-only) login.
    #[serde(default)]
    pub username: String,
    /// OAuth token, without the `oauth:` prefix.
    #[serde(default)]
    pub access_code: String,
    /// Channel to join, without the leading `#`.
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_true")]
    pub initialize_on_start: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            access_code: String::new(),
            channel: String::new(),
            initialize_on_start: true,
        }
    }
}

/// Outbound line budget enforced by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_lines_per_interval")]
    pub lines_per_interval: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl RateLimitConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            lines_per_interval: default_lines_per_interval(),
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    #[serde(default = "default_help_verb")]
    pub help_verb: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            help_verb: default_help_verb(),
        }
    }
}

/// Periodic driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl DriverConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

/// Diagnostic log level and chat transcript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub transcript: bool,
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            transcript: false,
            transcript_dir: default_transcript_dir(),
        }
    }
}

fn default_host() -> String {
    "irc.chat.twitch.tv".to_string()
}
fn default_port() -> u16 {
    6667
}
fn default_true() -> bool {
    true
}
fn default_lines_per_interval() -> u32 {
    15
}
fn default_interval_secs() -> u64 {
    30
}
fn default_help_verb() -> String {
    "!help".to_string()
}
fn default_tick_millis() -> u64 {
    50
}
fn default_level() -> String {
    "info".to_string()
}
fn default_transcript_dir() -> String {
    "~/.local/share/chatcmd/logs".to_string()
}
