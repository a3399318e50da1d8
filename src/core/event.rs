//! A single log record under construction

use super::error::Result;
use super::log_level::LogLevel;
use super::logger::Logger;
use super::timestamp::record_time_now;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::panic::Location;

/// Builder for one record, obtained from [`Logger::event`].
///
/// Fields are written in the order they are added. A disabled event (level below
/// the logger's minimum) does nothing and costs no encoding.
///
/// # Example
///
/// ```
/// use rust_logger_config::{LogLevel, Logger, NopWriter};
///
/// let logger = Logger::new(NopWriter);
/// logger
///     .event(LogLevel::Info)
///     .field("cats", 5)
///     .field("names", ["tom", "felix"])
///     .msg("meow")
///     .unwrap();
/// ```
#[must_use = "an event does nothing until `msg` or `send` is called"]
pub struct Event<'a> {
    logger: &'a Logger,
    level: LogLevel,
    caller: Option<&'static Location<'static>>,
    fields: Vec<(String, Value)>,
    enabled: bool,
}

impl<'a> Event<'a> {
    pub(crate) fn new(
        logger: &'a Logger,
        level: LogLevel,
        caller: Option<&'static Location<'static>>,
        enabled: bool,
    ) -> Self {
        Self {
            logger,
            level,
            caller,
            fields: Vec::new(),
            enabled,
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Attach a field; values that fail to serialize are recorded as an error string
    pub fn field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if self.enabled {
            let value = serde_json::to_value(value)
                .unwrap_or_else(|e| Value::String(format!("[error: {}]", e)));
            self.fields.push((key.into(), value));
        }
        self
    }

    /// Attach an `error` field
    pub fn err(self, error: &dyn Display) -> Self {
        let rendered = error.to_string();
        self.field("error", rendered)
    }

    /// Finish the record with a message and write it
    pub fn msg(self, message: impl AsRef<str>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let buf = self.encode(message.as_ref())?;
        self.logger.sink().write_level(self.level, &buf)?;
        Ok(())
    }

    /// Write the record without a message
    pub fn send(self) -> Result<()> {
        self.msg("")
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(b"{\"level\":");
        serde_json::to_writer(&mut buf, self.level.as_str())?;

        if self.logger.has_timestamp() {
            push_field(&mut buf, "time", &Value::String(record_time_now()))?;
        }
        if let Some(location) = self.caller {
            let caller = format!("{}:{}", location.file(), location.line());
            push_field(&mut buf, "caller", &Value::String(caller))?;
        }
        for (key, value) in self.logger.context() {
            push_field(&mut buf, key, value)?;
        }
        for (key, value) in &self.fields {
            push_field(&mut buf, key, value)?;
        }
        if !message.is_empty() {
            push_field(&mut buf, "message", &Value::String(message.to_string()))?;
        }

        buf.extend_from_slice(b"}\n");
        Ok(buf)
    }
}

fn push_field(buf: &mut Vec<u8>, key: &str, value: &Value) -> Result<()> {
    buf.push(b',');
    serde_json::to_writer(&mut *buf, key)?;
    buf.push(b':');
    serde_json::to_writer(&mut *buf, value)?;
    Ok(())
}
