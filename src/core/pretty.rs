//! Human-readable rendering of JSON records
//!
//! Turns `{"level":"debug","cats":5,"message":"meow"}` into
//! `<nil> DBG meow cats=5`, one line per record.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::timestamp::{parse_record_time, TimestampFormat};
use super::writer::{LevelWriter, Sink};
use chrono::Local;
use colored::Color;
use serde_json::{Map, Value};

const LEVEL_FIELD: &str = "level";
const TIME_FIELD: &str = "time";
const MESSAGE_FIELD: &str = "message";
const CALLER_FIELD: &str = "caller";
const ERROR_FIELD: &str = "error";

/// Decorator that re-renders each JSON record as a console line before
/// handing it to the inner writer. Input that is not a JSON object passes
/// through unchanged.
pub struct PrettyWriter {
    inner: Box<dyn LevelWriter>,
    color: bool,
    time_format: TimestampFormat,
}

impl PrettyWriter {
    pub fn new(inner: Sink) -> Self {
        Self {
            inner: inner.into_level_writer(),
            color: false,
            time_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, time_format: TimestampFormat) -> Self {
        self.time_format = time_format;
        self
    }

    /// Render one record; `None` when the payload is not a JSON object
    #[must_use]
    pub fn render(&self, buf: &[u8]) -> Option<String> {
        let record: Map<String, Value> = serde_json::from_slice(buf).ok()?;

        let mut parts = Vec::with_capacity(5);
        parts.push(self.format_time(record.get(TIME_FIELD)));
        parts.push(self.format_level(record.get(LEVEL_FIELD)));
        if let Some(caller) = record.get(CALLER_FIELD) {
            parts.push(self.format_caller(caller));
        }
        if let Some(message) = record.get(MESSAGE_FIELD) {
            let message = plain_value(message);
            if !message.is_empty() {
                parts.push(message);
            }
        }
        let fields = self.format_fields(&record);
        if !fields.is_empty() {
            parts.push(fields);
        }

        let mut line = parts.join(" ");
        line.push('\n');
        Some(line)
    }

    fn format_time(&self, time: Option<&Value>) -> String {
        let rendered = match time {
            None | Some(Value::Null) => "<nil>".to_string(),
            Some(Value::String(s)) => match parse_record_time(s) {
                Some(at) => self.time_format.format(&at.with_timezone(&Local)),
                None => s.clone(),
            },
            Some(other) => other.to_string(),
        };
        if self.color {
            paint(&rendered, Color::BrightBlack, false)
        } else {
            rendered
        }
    }

    fn format_level(&self, level: Option<&Value>) -> String {
        let Some(tag) = level.and_then(Value::as_str) else {
            return "???".to_string();
        };
        match tag.parse::<LogLevel>() {
            Ok(level) if level != LogLevel::Disabled => {
                let label = level.short_label();
                if self.color {
                    paint(label, level.color(), level >= LogLevel::Error)
                } else {
                    label.to_string()
                }
            }
            _ => tag.to_uppercase().chars().take(3).collect(),
        }
    }

    fn format_caller(&self, caller: &Value) -> String {
        let caller = plain_value(caller);
        if self.color {
            format!("{}{}", bold(&caller), paint(" >", Color::Cyan, false))
        } else {
            format!("{} >", caller)
        }
    }

    fn format_fields(&self, record: &Map<String, Value>) -> String {
        let mut names: Vec<&String> = record
            .keys()
            .filter(|k| {
                !matches!(
                    k.as_str(),
                    LEVEL_FIELD | TIME_FIELD | MESSAGE_FIELD | CALLER_FIELD
                )
            })
            .collect();
        // Keys already come sorted; only the error field jumps the queue
        if let Some(pos) = names.iter().position(|k| k.as_str() == ERROR_FIELD) {
            let error = names.remove(pos);
            names.insert(0, error);
        }

        names
            .into_iter()
            .map(|name| {
                let value = field_value(&record[name.as_str()]);
                if !self.color {
                    format!("{}={}", name, value)
                } else if name == ERROR_FIELD {
                    let key = format!("{}=", name);
                    format!(
                        "{}{}",
                        paint(&key, Color::Red, false),
                        paint(&value, Color::Red, false)
                    )
                } else {
                    format!("{}{}", paint(&format!("{}=", name), Color::Cyan, false), value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl LevelWriter for PrettyWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        let rendered = self.render(buf);
        let out = rendered.as_deref().map_or(buf, str::as_bytes);
        let written = self.inner.write_level(level, out)?;
        if written != out.len() {
            return Err(LoggerError::short_write(written, out.len()));
        }
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }
}

/// Wrap `text` in SGR escapes; emitted unconditionally, independent of
/// terminal detection
fn paint(text: &str, color: Color, bold: bool) -> String {
    let weight = if bold { "1;" } else { "" };
    format!("\x1b[{}{}m{}\x1b[0m", weight, color.to_fg_str(), text)
}

fn bold(text: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", text)
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quote(s) => Value::String(s.clone()).to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quote(s: &str) -> bool {
    s.bytes()
        .any(|b| b < 0x20 || b > 0x7e || b == b' ' || b == b'\\' || b == b'"')
}
