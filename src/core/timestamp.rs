//! Timestamp formatting utilities
//!
//! Records carry their `time` field as ISO 8601 UTC with millisecond precision.
//! The pretty renderer re-renders that value in local time, either with the
//! default RFC 3339 millisecond pattern or a strftime pattern from configuration.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};

/// Pattern of the `time` field written into every record
pub const RECORD_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Pattern used by pretty output when no `time_format` is configured
pub const DEFAULT_PRETTY_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_logger_config::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&at), "2025-01-08T10:30:45.000Z");
///
/// let year = TimestampFormat::custom("%Y").unwrap();
/// assert_eq!(year.format(&at), "2025");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 in UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with milliseconds and numeric offset: `2025-01-08T10:30:45.123+00:00`
    #[default]
    Rfc3339Millis,

    /// Custom strftime format, validated by [`TimestampFormat::custom`]
    Custom(String),
}

impl TimestampFormat {
    /// Build a custom format, rejecting patterns chrono cannot render
    pub fn custom(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "time_format",
                format!("invalid strftime pattern '{}'", pattern),
            ));
        }
        Ok(TimestampFormat::Custom(pattern))
    }

    /// Custom pattern if one is given and non-empty, otherwise the default
    pub fn from_pattern(pattern: Option<&str>) -> Result<Self> {
        match pattern {
            Some(p) if !p.is_empty() => Self::custom(p),
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            TimestampFormat::Iso8601 => RECORD_TIME_PATTERN,
            TimestampFormat::Rfc3339Millis => DEFAULT_PRETTY_TIME_PATTERN,
            TimestampFormat::Custom(pattern) => pattern,
        }
    }

    /// Format a datetime according to this format
    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::new();
        if write!(out, "{}", datetime.format(self.pattern())).is_err() {
            // Unvalidated custom patterns fall back to the default rendering
            out.clear();
            let _ = write!(out, "{}", datetime.format(DEFAULT_PRETTY_TIME_PATTERN));
        }
        out
    }
}

/// Current time rendered for the record `time` field
#[must_use]
pub fn record_time_now() -> String {
    TimestampFormat::Iso8601.format(&Utc::now())
}

/// Parse a record `time` value back into a datetime
#[must_use]
pub fn parse_record_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}
