//! # Rust Logger Config
//!
//! Build a structured JSON logger from a declarative configuration.
//!
//! A [`Config`] names any number of writers (console streams, rotating files,
//! syslog, the systemd journal or the browser console), each with its own
//! output format and level window. Compiling the configuration produces one
//! [`Logger`] that fans every record out to all of them.
//!
//! ```
//! use rust_logger_config::{Config, LogLevel};
//!
//! let config = Config::from_json_str(r#"{
//!     "writers": [{"type": "stderr", "format": "pretty-colored"}],
//!     "min_level": "info"
//! }"#).unwrap();
//! let logger = config.compile().unwrap();
//!
//! logger.event(LogLevel::Info).field("port", 8080).msg("listening").unwrap();
//! ```
//!
//! ## Features
//!
//! - `file` (default): the rotating `file` writer
//! - `syslog` (default): `syslog` and `syslog-cee` writers on Unix
//! - `journald` (default): the `journald` writer on Unix
//!
//! Kinds whose feature or platform is missing stay registered and fail to
//! compile with an "unsupported" error.

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::config::{Config, LogFormat, WriterConfig};
    pub use crate::core::{
        LevelWriter, LogLevel, Logger, LoggerError, Result, Sink, WriterRegistry,
    };
}

pub use config::{Config, FileConfig, LogFormat, SyslogConfig, WriterConfig};
pub use core::{
    fan_out, global_registry, kinds, register_writer, set_outputs, ByteWriter, Event,
    LevelWindowWriter, LevelWriter, LogLevel, Logger, LoggerError, MultiLevelWriter, NopWriter,
    OutputSlots, PlainAdapter, PrettyWriter, RegisteredWriter, Result, SharedWriter, Sink,
    TimestampFormat, WriterCompiler, WriterRegistry,
};
