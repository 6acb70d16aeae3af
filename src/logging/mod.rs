//! Diagnostic logging setup and chat transcript files.
//!
//! Diagnostics go through `tracing`. The optional transcript writes received
//! chat lines to daily files named `<channel>_<date>.log` in the configured
//! directory (default: `~/.local/share/chatcmd/logs/`).

use crate::app::event::ChatMessage;
use crate::config::LoggingConfig;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}

/// Writes received chat lines to per-channel daily transcript files.
///
/// Only the current day's file is kept open; it is swapped for a new one when
/// the date changes. A file that cannot be opened is reported once and then
/// skipped for the rest of that day.
pub struct ChatLogger {
    enabled: bool,
    log_dir: PathBuf,
    channel: String,
    current: Option<(String, Option<fs::File>)>,
}

impl ChatLogger {
    pub fn new(config: &LoggingConfig, channel: &str) -> Self {
        Self {
            enabled: config.transcript,
            log_dir: expand_home(&config.transcript_dir),
            channel: channel.trim_start_matches('#').to_lowercase(),
            current: None,
        }
    }

    /// Append one chat line. No-op if transcripts are disabled.
    pub fn log_message(&mut self, msg: &ChatMessage) {
        self.log_at(msg, Local::now());
    }

    fn log_at(&mut self, msg: &ChatMessage, now: DateTime<Local>) {
        if !self.enabled {
            return;
        }

        let line = format!("[{}] <{}> {}", now.format("%H:%M:%S"), msg.sender, msg.text);

        // Sanitize channel for filename
        let safe_channel: String = self
            .channel
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let filename = format!("{}_{}.log", safe_channel, now.format("%Y-%m-%d"));

        if !matches!(&self.current, Some((name, _)) if *name == filename) {
            let file = self.open(&filename);
            self.current = Some((filename, file));
        }

        if let Some((_, Some(file))) = self.current.as_mut() {
            if let Err(e) = writeln!(file, "{}", line) {
                warn!("transcript write failed: {}", e);
            }
        }
    }

    fn open(&self, filename: &str) -> Option<fs::File> {
        let path = self.log_dir.join(filename);
        let opened = fs::create_dir_all(&self.log_dir)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
        match opened {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), "cannot open transcript: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path, enabled: bool) -> LoggingConfig {
        LoggingConfig {
            transcript: enabled,
            transcript_dir: dir.to_string_lossy().into_owned(),
            ..LoggingConfig::default()
        }
    }

    fn chat(sender: &str, text: &str) -> ChatMessage {
        ChatMessage {
            sender: sender.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_transcript_written_per_channel_and_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChatLogger::new(&config(dir.path(), true), "#SomeChannel");
        logger.log_message(&chat("alice", "hello"));
        logger.log_message(&chat("bob", "!red"));

        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let path = dir.path().join(format!("somechannel_{}.log", date));
        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("<alice> hello"));
        assert!(lines[1].ends_with("<bob> !red"));
    }

    #[test]
    fn test_new_day_replaces_open_file() {
        use chrono::TimeZone;

        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChatLogger::new(&config(dir.path(), true), "somechannel");
        let day_one = Local.with_ymd_and_hms(2026, 1, 1, 23, 59, 0).unwrap();
        let day_two = Local.with_ymd_and_hms(2026, 1, 2, 0, 1, 0).unwrap();

        logger.log_at(&chat("alice", "late"), day_one);
        logger.log_at(&chat("bob", "early"), day_two);

        let (open, file) = logger.current.as_ref().unwrap();
        assert_eq!(open, "somechannel_2026-01-02.log");
        assert!(file.is_some());

        let first = fs::read_to_string(dir.path().join("somechannel_2026-01-01.log")).unwrap();
        let second = fs::read_to_string(dir.path().join("somechannel_2026-01-02.log")).unwrap();
        assert!(first.trim_end().ends_with("<alice> late"));
        assert!(second.trim_end().ends_with("<bob> early"));
    }

    #[test]
    fn test_disabled_transcript_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = ChatLogger::new(&config(dir.path(), false), "somechannel");
        logger.log_message(&chat("alice", "hello"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/logs"), PathBuf::from("/tmp/logs"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/logs"), home.join("logs"));
        }
    }
}
