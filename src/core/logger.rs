//! Main logger implementation
//!
//! A [`Logger`] encodes each record as one JSON line and hands it, tagged with
//! its level, to a single [`LevelWriter`]. Everything runs on the caller's
//! thread; the writer decides how concurrent writes are serialized.

use super::{
    error::Result,
    event::Event,
    fan_out::NopWriter,
    log_level::LogLevel,
    writer::LevelWriter,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Cheaply cloneable handle to a configured logger
///
/// # Example
///
/// ```
/// use rust_logger_config::{LogLevel, Logger, NopWriter};
///
/// let logger = Logger::new(NopWriter)
///     .with_timestamp()
///     .with_field("service", "api-gateway")
///     .with_min_level(Some(LogLevel::Info));
///
/// assert!(logger.enabled(LogLevel::Warn));
/// assert!(!logger.enabled(LogLevel::Debug));
/// logger.info("started");
/// ```
#[derive(Clone)]
pub struct Logger {
    writer: Arc<dyn LevelWriter>,
    min_level: Option<LogLevel>,
    timestamp: bool,
    caller: bool,
    context: Vec<(String, Value)>,
}

impl Logger {
    /// Logger writing to `writer`, with no minimum level and no context fields
    pub fn new(writer: impl LevelWriter + 'static) -> Self {
        Self::from_boxed(Box::new(writer))
    }

    pub fn from_boxed(writer: Box<dyn LevelWriter>) -> Self {
        Self {
            writer: Arc::from(writer),
            min_level: None,
            timestamp: false,
            caller: false,
            context: Vec::new(),
        }
    }

    /// Inert logger: every record is discarded before encoding
    #[must_use]
    pub fn nop() -> Self {
        Self::new(NopWriter).with_min_level(Some(LogLevel::Disabled))
    }

    /// Add a `time` field to every record
    #[must_use]
    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    /// Add a `caller` field (`file:line`) to every record
    #[must_use]
    pub fn with_caller(mut self) -> Self {
        self.caller = true;
        self
    }

    /// Add a context field written into every record, after time and caller
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| Value::String(format!("[error: {}]", e)));
        self.context.push((key.into(), value));
        self
    }

    /// Records below `level` are dropped before they reach the writer
    #[must_use]
    pub fn with_min_level(mut self, level: Option<LogLevel>) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn min_level(&self) -> Option<LogLevel> {
        self.min_level
    }

    #[must_use]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Disabled && self.min_level.map_or(true, |min| level >= min)
    }

    pub(crate) fn has_timestamp(&self) -> bool {
        self.timestamp
    }

    pub(crate) fn context(&self) -> &[(String, Value)] {
        &self.context
    }

    pub(crate) fn sink(&self) -> &dyn LevelWriter {
        self.writer.as_ref()
    }

    /// Start a record at `level`
    #[track_caller]
    pub fn event(&self, level: LogLevel) -> Event<'_> {
        let enabled = self.enabled(level);
        let caller = if enabled && self.caller {
            Some(Location::caller())
        } else {
            None
        };
        Event::new(self, level, caller, enabled)
    }

    /// Write a message at `level`; write failures are reported on stderr
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let event = self.event(level);
        if let Err(e) = event.msg(message.into()) {
            eprintln!("[LOGGER ERROR] Failed to write {} record: {}", level, e);
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.writer.flush()
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    #[inline]
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>) {
        self.log(LogLevel::Panic, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::nop()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("timestamp", &self.timestamp)
            .field("caller", &self.caller)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
