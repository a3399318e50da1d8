//! Combining finished writers into the single sink a logger writes to

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::writer::LevelWriter;

/// Inert writer: discards every record and never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NopWriter;

impl LevelWriter for NopWriter {
    fn write_level(&self, _level: LogLevel, buf: &[u8]) -> Result<usize> {
        Ok(buf.len())
    }
}

/// Forwards every record to each member, in configured order.
///
/// All members are invoked even when an earlier one fails; the first error
/// encountered is returned. A member that accepts fewer bytes than it was given
/// counts as failed with [`LoggerError::ShortWrite`].
pub struct MultiLevelWriter {
    writers: Vec<Box<dyn LevelWriter>>,
}

impl MultiLevelWriter {
    pub fn new(writers: Vec<Box<dyn LevelWriter>>) -> Self {
        Self { writers }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl LevelWriter for MultiLevelWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        let mut first_error = None;
        for writer in &self.writers {
            let outcome = match writer.write_level(level, buf) {
                Ok(n) if n != buf.len() => Err(LoggerError::short_write(n, buf.len())),
                other => other,
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for writer in &self.writers {
            if let Err(e) = writer.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Zero writers yield [`NopWriter`], one is used as-is, more are combined.
pub fn fan_out(mut writers: Vec<Box<dyn LevelWriter>>) -> Box<dyn LevelWriter> {
    match writers.len() {
        0 => Box::new(NopWriter),
        1 => writers.remove(0),
        _ => Box::new(MultiLevelWriter::new(writers)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    struct Member {
        name: &'static str,
        journal: Journal,
        outcome: fn(usize) -> Result<usize>,
    }

    impl LevelWriter for Member {
        fn write_level(&self, _level: LogLevel, buf: &[u8]) -> Result<usize> {
            self.journal.lock().push(self.name);
            (self.outcome)(buf.len())
        }
    }

    fn member(
        name: &'static str,
        journal: &Journal,
        outcome: fn(usize) -> Result<usize>,
    ) -> Box<dyn LevelWriter> {
        Box::new(Member {
            name,
            journal: Arc::clone(journal),
            outcome,
        })
    }

    fn ok(n: usize) -> Result<usize> {
        Ok(n)
    }

    #[test]
    fn test_empty_fan_out_is_inert() {
        let writer = fan_out(Vec::new());
        assert_eq!(writer.write_level(LogLevel::Panic, b"abc").unwrap(), 3);
        writer.flush().unwrap();
    }

    #[test]
    fn test_single_writer_used_directly() {
        let journal = Journal::default();
        let writer = fan_out(vec![member("only", &journal, ok)]);
        writer.write_level(LogLevel::Info, b"x").unwrap();
        assert_eq!(*journal.lock(), vec!["only"]);
    }

    #[test]
    fn test_members_invoked_in_order() {
        let journal = Journal::default();
        let writer = fan_out(vec![
            member("a", &journal, ok),
            member("b", &journal, ok),
            member("c", &journal, ok),
        ]);
        writer.write_level(LogLevel::Info, b"x").unwrap();
        writer.write_level(LogLevel::Info, b"y").unwrap();
        assert_eq!(*journal.lock(), vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn test_failure_reported_after_all_members_run() {
        let journal = Journal::default();
        let writer = fan_out(vec![
            member("a", &journal, |_| Err(LoggerError::writer("disk full"))),
            member("b", &journal, |_| Err(LoggerError::writer("second"))),
            member("c", &journal, ok),
        ]);
        let err = writer.write_level(LogLevel::Error, b"x").unwrap_err();
        assert_eq!(err.to_string(), "Writer error: disk full");
        assert_eq!(*journal.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_short_write_is_an_error() {
        let journal = Journal::default();
        let writer = MultiLevelWriter::new(vec![
            member("a", &journal, ok),
            member("b", &journal, |n| Ok(n - 1)),
        ]);
        let err = writer.write_level(LogLevel::Info, b"four").unwrap_err();
        assert!(matches!(err, LoggerError::ShortWrite { written: 3, expected: 4 }));
    }
}
