//! Formatting macros over [`Logger::log`](crate::Logger::log)
//!
//! ```
//! use rust_logger_config::{info, warn, Logger, NopWriter};
//!
//! let logger = Logger::new(NopWriter);
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//! warn!(logger, "{} retries left", 2);
//! ```
//!
//! The record's caller location is the macro call site.

/// Log a formatted message at an explicit level
///
/// ```
/// use rust_logger_config::{log, LogLevel, Logger, NopWriter};
///
/// let logger = Logger::new(NopWriter);
/// log!(logger, LogLevel::Error, "status {}", 503);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log at fatal level; the process keeps running
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LevelWriter, LogLevel, Logger, Result};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Lines(Arc<Mutex<Vec<(LogLevel, String)>>>);

    impl LevelWriter for Lines {
        fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
            self.0
                .lock()
                .push((level, String::from_utf8_lossy(buf).into_owned()));
            Ok(buf.len())
        }
    }

    #[test]
    fn test_macros_format_and_tag_level() {
        let lines = Lines::default();
        let logger = Logger::new(lines.clone());

        trace!(logger, "t{}", 1);
        debug!(logger, "d");
        info!(logger, "user {} logged in", 42);
        warn!(logger, "w");
        error!(logger, "code {}", 500);
        fatal!(logger, "f");
        log!(logger, LogLevel::Panic, "p {}", "x");

        let got: Vec<LogLevel> = lines.0.lock().iter().map(|(l, _)| *l).collect();
        assert_eq!(got, LogLevel::ALL.to_vec());
        assert!(lines.0.lock()[2].1.contains("\"message\":\"user 42 logged in\""));
    }

    #[test]
    fn test_macro_caller_is_call_site() {
        let lines = Lines::default();
        let logger = Logger::new(lines.clone()).with_caller();
        let line = line!() + 1;
        info!(logger, "here");
        let expected = format!("\"caller\":\"{}:{}\"", file!(), line);
        assert!(lines.0.lock()[0].1.contains(&expected));
    }
}
