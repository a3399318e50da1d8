//! Declarative logger configuration
//!
//! A [`Config`] lists writers and global options. Compiling it resolves each
//! writer through a [`WriterRegistry`], fans the results out into one sink and
//! wraps that sink in a [`Logger`].
//!
//! ```
//! use rust_logger_config::{Config, LogLevel};
//!
//! let config = Config::from_json_str(r#"{
//!     "writers": [
//!         {"type": "stdout", "format": "pretty", "max_level": "warn"},
//!         {"type": "stderr", "format": "pretty", "min_level": "error"}
//!     ],
//!     "min_level": "debug",
//!     "metadata": {"service": "billing"}
//! }"#).unwrap();
//!
//! let logger = config.compile().unwrap();
//! assert!(!logger.enabled(LogLevel::Trace));
//! ```

pub mod writer_config;

pub use writer_config::{FileConfig, LogFormat, SyslogConfig, WriterConfig};

use crate::core::error::{LoggerError, Result};
use crate::core::fan_out::fan_out;
use crate::core::log_level::LogLevel;
use crate::core::logger::Logger;
use crate::core::registry::{global_registry, WriterRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Writers in fan-out order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub writers: Vec<WriterConfig>,

    /// Global floor; `disabled` turns the whole logger off
    #[serde(
        default,
        deserialize_with = "crate::core::log_level::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_level: Option<LogLevel>,

    /// Include a `time` field, defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<bool>,

    /// Include a `caller` field
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub caller: bool,

    /// Fields attached to every record, emitted in key order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger config",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    /// Compile against the process-wide registry
    ///
    /// The registry's read lock is held while writers are constructed, so a
    /// writer compiler must not call [`crate::register_writer`].
    pub fn compile(&self) -> Result<Logger> {
        let registry = global_registry().read();
        self.compile_with(&registry)
    }

    /// Compile against an explicit registry
    ///
    /// Fails on the first writer that does not compile; the error carries that
    /// writer's 1-based position.
    pub fn compile_with(&self, registry: &WriterRegistry) -> Result<Logger> {
        if self.writers.is_empty() || self.min_level == Some(LogLevel::Disabled) {
            return Ok(Logger::nop());
        }

        let writers = self
            .writers
            .iter()
            .enumerate()
            .map(|(i, wc)| {
                wc.compile_with(registry)
                    .map_err(|e| LoggerError::at_writer(i + 1, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut logger = Logger::from_boxed(fan_out(writers));
        if self.timestamp.unwrap_or(true) {
            logger = logger.with_timestamp();
        }
        if self.caller {
            logger = logger.with_caller();
        }
        for (key, value) in &self.metadata {
            logger = logger.with_field(key.clone(), value);
        }
        Ok(logger.with_min_level(self.min_level))
    }
}
