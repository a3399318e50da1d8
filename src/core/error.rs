//! Error types for the logger configuration system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Writer kind has no registered compiler
    #[error("unknown writer type \"{kind}\"")]
    UnknownWriterType { kind: String },

    /// Format tag is not one of json, pretty, pretty-colored
    #[error("unknown format \"{format}\"")]
    UnknownFormat { format: String },

    /// Writer kind exists but is not available on this platform
    #[error("writer type \"{kind}\" not supported on this OS")]
    UnsupportedWriter { kind: String },

    /// Compilation of a single writer entry failed, `index` is 1-based
    #[error("failed to parse config for writer #{index}: {source}")]
    WriterConfig {
        index: usize,
        #[source]
        source: Box<LoggerError>,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File writer error with path
    #[error("File writer error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// A writer accepted fewer bytes than it was given
    #[error("short write: {written}/{expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an unknown writer type error
    pub fn unknown_writer(kind: impl Into<String>) -> Self {
        LoggerError::UnknownWriterType { kind: kind.into() }
    }

    /// Create an unknown format error
    pub fn unknown_format(format: impl Into<String>) -> Self {
        LoggerError::UnknownFormat {
            format: format.into(),
        }
    }

    /// Create an unsupported writer error
    pub fn unsupported(kind: impl Into<String>) -> Self {
        LoggerError::UnsupportedWriter { kind: kind.into() }
    }

    /// Wrap an error with the 1-based position of the writer entry that produced it
    pub fn at_writer(index: usize, source: LoggerError) -> Self {
        LoggerError::WriterConfig {
            index,
            source: Box::new(source),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file writer error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn short_write(written: usize, expected: usize) -> Self {
        LoggerError::ShortWrite { written, expected }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Position of the failing writer entry, if this error came from compiling one
    #[must_use]
    pub fn writer_index(&self) -> Option<usize> {
        match self {
            LoggerError::WriterConfig { index, .. } => Some(*index),
            _ => None,
        }
    }
}
