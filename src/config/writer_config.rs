//! Configuration of a single log writer and its assembly into a finished writer

use crate::core::error::{LoggerError, Result};
use crate::core::level_window::LevelWindowWriter;
use crate::core::log_level::LogLevel;
use crate::core::pretty::PrettyWriter;
use crate::core::registry::WriterRegistry;
use crate::core::timestamp::TimestampFormat;
use crate::core::writer::{LevelWriter, Sink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// How records are rendered for a writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Raw JSON records, one per line
    #[default]
    Json,
    /// Human-readable console lines without color
    Pretty,
    /// Human-readable console lines with ANSI color
    PrettyColored,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::PrettyColored => "pretty-colored",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "pretty-colored" => Ok(LogFormat::PrettyColored),
            other => Err(LoggerError::unknown_format(other)),
        }
    }
}

/// Options of the `file` writer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Current log file; backups land next to it as `name-<timestamp>.ext`.
    /// Empty means `<tmpdir>/<exe>-rotating.log`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    /// Size in megabytes that triggers rotation, 0 means 100
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_size: u64,
    /// Days to keep rotated files, 0 keeps them forever
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_age: u64,
    /// Number of rotated files to keep, 0 keeps all
    #[serde(default, skip_serializing_if = "is_zero_usize")]
    pub max_backups: usize,
    /// Name backups with local time instead of UTC
    #[serde(default, skip_serializing_if = "is_false")]
    pub local_time: bool,
    /// Gzip rotated files
    #[serde(default, skip_serializing_if = "is_false")]
    pub compress: bool,
}

/// Options of the `syslog` and `syslog-cee` writers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogConfig {
    /// `tcp`, `udp`, `unix`, `unixgram`, or empty for the local daemon
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    /// Priority bits, facility | severity
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub flags: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

/// One entry of the `writers` list
///
/// Fields that do not apply to the writer's kind are ignored.
///
/// # Example
///
/// ```
/// use rust_logger_config::{LogFormat, LogLevel, WriterConfig};
///
/// let wc: WriterConfig = serde_json::from_str(
///     r#"{"type": "stderr", "format": "pretty", "min_level": "error"}"#,
/// ).unwrap();
/// assert_eq!(wc.kind, "stderr");
/// assert_eq!(wc.log_format().unwrap(), LogFormat::Pretty);
/// assert_eq!(wc.min_level, Some(LogLevel::Error));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(
        default,
        deserialize_with = "crate::core::log_level::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_level: Option<LogLevel>,
    #[serde(
        default,
        deserialize_with = "crate::core::log_level::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_level: Option<LogLevel>,

    /// strftime pattern for pretty formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,

    #[serde(flatten)]
    pub syslog: SyslogConfig,
    #[serde(flatten)]
    pub file: FileConfig,
}

impl WriterConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format.as_str().to_string());
        self
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_max_level(mut self, level: LogLevel) -> Self {
        self.max_level = Some(level);
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, pattern: impl Into<String>) -> Self {
        self.time_format = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.file = file;
        self
    }

    #[must_use]
    pub fn with_syslog(mut self, syslog: SyslogConfig) -> Self {
        self.syslog = syslog;
        self
    }

    /// Parsed `format` tag, absent or empty meaning JSON
    pub fn log_format(&self) -> Result<LogFormat> {
        self.format.as_deref().unwrap_or_default().parse()
    }

    /// Build the finished writer: construct the sink, decorate it for the
    /// configured format, then apply the level window if either bound is set.
    pub fn compile_with(&self, registry: &WriterRegistry) -> Result<Box<dyn LevelWriter>> {
        let entry = registry.resolve(&self.kind)?;
        let sink = entry.compile(self)?;

        let format = if entry.raw_only() {
            LogFormat::Json
        } else {
            self.log_format()?
        };
        let sink = match format {
            LogFormat::Json => sink,
            LogFormat::Pretty | LogFormat::PrettyColored => {
                let time_format = TimestampFormat::from_pattern(self.time_format.as_deref())?;
                Sink::leveled(
                    PrettyWriter::new(sink)
                        .with_color(format == LogFormat::PrettyColored)
                        .with_time_format(time_format),
                )
            }
        };

        let sink = if self.min_level.is_some() || self.max_level.is_some() {
            Sink::leveled(LevelWindowWriter::new(sink, self.min_level, self.max_level))
        } else {
            sink
        };
        Ok(sink.into_level_writer())
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_zero_usize(v: &usize) -> bool {
    *v == 0
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}
