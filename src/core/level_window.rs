//! Per-destination severity window

use super::error::Result;
use super::log_level::LogLevel;
use super::writer::{LevelWriter, Sink};

/// Passes records whose level lies in the inclusive window `[min, max]`.
///
/// A `None` bound is unbounded on that side. Records outside the window are
/// dropped but still reported as fully written, so callers that compare the
/// returned count against the payload length do not see a failure. A window with
/// `min > max` is accepted and filters everything.
///
/// # Example
///
/// ```
/// use rust_logger_config::core::{LevelWindowWriter, LevelWriter, LogLevel, NopWriter, Sink};
///
/// let window = LevelWindowWriter::new(Sink::leveled(NopWriter), Some(LogLevel::Error), None);
/// assert!(window.allows(LogLevel::Fatal));
/// assert!(!window.allows(LogLevel::Warn));
/// assert_eq!(window.write_level(LogLevel::Warn, b"dropped").unwrap(), 7);
/// ```
pub struct LevelWindowWriter {
    inner: Box<dyn LevelWriter>,
    min: Option<LogLevel>,
    max: Option<LogLevel>,
}

impl LevelWindowWriter {
    pub fn new(inner: Sink, min: Option<LogLevel>, max: Option<LogLevel>) -> Self {
        Self {
            inner: inner.into_level_writer(),
            min,
            max,
        }
    }

    #[inline]
    #[must_use]
    pub fn allows(&self, level: LogLevel) -> bool {
        self.min.map_or(true, |min| level >= min) && self.max.map_or(true, |max| level <= max)
    }

    #[must_use]
    pub fn min(&self) -> Option<LogLevel> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<LogLevel> {
        self.max
    }
}

impl LevelWriter for LevelWindowWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        if self.allows(level) {
            self.inner.write_level(level, buf)
        } else {
            Ok(buf.len())
        }
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }
}
