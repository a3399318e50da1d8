//! Writer capabilities for log output destinations
//!
//! Every destination is one of two shapes: a [`LevelWriter`] that receives the
//! record's level with its bytes, or a plain [`ByteWriter`]. The choice is made
//! once, when a [`Sink`] is turned into a level writer, so the write path never
//! checks capabilities at runtime.

use super::error::Result;
use super::log_level::LogLevel;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Destination that accepts a severity tag alongside each encoded record
pub trait LevelWriter: Send + Sync {
    /// Write one encoded record, returning the number of bytes accepted
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Plain byte-stream destination
pub trait ByteWriter: Send + Sync {
    fn write(&self, buf: &[u8]) -> Result<usize>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<W: LevelWriter + ?Sized> LevelWriter for Box<W> {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        (**self).write_level(level, buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<W: LevelWriter + ?Sized> LevelWriter for Arc<W> {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        (**self).write_level(level, buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<W: ByteWriter + ?Sized> ByteWriter for Box<W> {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

impl<W: ByteWriter + ?Sized> ByteWriter for Arc<W> {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// A concrete destination produced by a writer compiler
pub enum Sink {
    Leveled(Box<dyn LevelWriter>),
    Plain(Box<dyn ByteWriter>),
}

impl Sink {
    pub fn leveled(writer: impl LevelWriter + 'static) -> Self {
        Sink::Leveled(Box::new(writer))
    }

    pub fn plain(writer: impl ByteWriter + 'static) -> Self {
        Sink::Plain(Box::new(writer))
    }

    /// Collapse to a level writer, wrapping plain sinks in [`PlainAdapter`]
    pub fn into_level_writer(self) -> Box<dyn LevelWriter> {
        match self {
            Sink::Leveled(writer) => writer,
            Sink::Plain(writer) => Box::new(PlainAdapter::new(writer)),
        }
    }

    #[must_use]
    pub fn is_leveled(&self) -> bool {
        matches!(self, Sink::Leveled(_))
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Leveled(_) => f.write_str("Sink::Leveled(..)"),
            Sink::Plain(_) => f.write_str("Sink::Plain(..)"),
        }
    }
}

/// Drops the level and performs an ordinary byte-stream write
pub struct PlainAdapter {
    inner: Box<dyn ByteWriter>,
}

impl PlainAdapter {
    pub fn new(inner: Box<dyn ByteWriter>) -> Self {
        Self { inner }
    }
}

impl LevelWriter for PlainAdapter {
    fn write_level(&self, _level: LogLevel, buf: &[u8]) -> Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }
}

/// Cloneable handle to any `std::io::Write`, serialized by a mutex
///
/// Used for the `stdout` and `stderr` output slots. Clones share the same
/// underlying stream.
///
/// # Example
///
/// ```
/// use rust_logger_config::core::{ByteWriter, SharedWriter};
///
/// let out = SharedWriter::new(Vec::<u8>::new());
/// assert_eq!(out.write(b"hello\n").unwrap(), 6);
/// ```
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedWriter {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Handle to the live process's standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Handle to the live process's standard error
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl ByteWriter for SharedWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.inner.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.inner.lock().flush()?;
        Ok(())
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl ByteWriter for Broken {
        fn write(&self, _buf: &[u8]) -> Result<usize> {
            Err(LoggerError::writer("broken pipe"))
        }
    }

    #[test]
    fn test_plain_adapter_reports_full_length() {
        let capture = Capture::default();
        let writer = Sink::plain(SharedWriter::new(capture.clone())).into_level_writer();

        let n = writer.write_level(LogLevel::Warn, b"{\"level\":\"warn\"}\n").unwrap();
        assert_eq!(n, 17);
        assert_eq!(capture.0.lock().as_slice(), b"{\"level\":\"warn\"}\n");
    }

    #[test]
    fn test_plain_adapter_propagates_errors() {
        let writer = Sink::plain(Broken).into_level_writer();
        assert!(writer.write_level(LogLevel::Info, b"x").is_err());
    }

    #[test]
    fn test_shared_writer_clones_share_stream() {
        let capture = Capture::default();
        let a = SharedWriter::new(capture.clone());
        let b = a.clone();
        a.write(b"one ").unwrap();
        b.write(b"two").unwrap();
        ByteWriter::flush(&a).unwrap();
        assert_eq!(capture.0.lock().as_slice(), b"one two");
    }

    #[test]
    fn test_sink_shape() {
        assert!(!Sink::plain(Broken).is_leveled());
        let leveled = Sink::Leveled(Sink::plain(Broken).into_level_writer());
        assert!(leveled.is_leveled());
    }
}
