//! Stage-tagged pipeline logs.
//!
//! Every entry is emitted as a `tracing` event with a `stage` field and
//! broadcast to in-process subscribers (tests, embedding callers).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level of a pipeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Pipeline stage, e.g. `Transform][rename_columns`
    pub stage: String,
    /// Log message
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn debug(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, stage, message)
    }

    pub fn info(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, stage, message)
    }

    pub fn success(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, stage, message)
    }

    pub fn warning(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, stage, message)
    }

    pub fn error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, stage, message)
    }

    /// `[Stage] message`, the line format of the console output.
    pub fn line(&self) -> String {
        format!("[{}] {}", self.stage, self.message)
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Forwards log entries to `tracing` and to every subscriber
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emit a log entry
    pub fn log(&self, entry: LogEntry) {
        let stage = entry.stage.as_str();
        let message = entry.message.as_str();
        match entry.level {
            LogLevel::Debug => tracing::debug!(stage, "[{}] {}", stage, message),
            LogLevel::Info => tracing::info!(stage, "[{}] {}", stage, message),
            LogLevel::Success => tracing::info!(stage, success = true, "[{}] {}", stage, message),
            LogLevel::Warning => tracing::warn!(stage, "[{}] {}", stage, message),
            LogLevel::Error => tracing::error!(stage, "[{}] {}", stage, message),
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for the entries logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_debug(stage: &str, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::debug(stage, msg));
}

pub fn log_info(stage: &str, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(stage, msg));
}

pub fn log_success(stage: &str, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(stage, msg));
}

pub fn log_warning(stage: &str, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(stage, msg));
}

pub fn log_error(stage: &str, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(stage, msg));
}
