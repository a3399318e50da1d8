//! Mapping from writer kind to the function that builds it
//!
//! Each registry binds the `stdout` and `stderr` kinds to an [`OutputSlots`]
//! pair chosen at construction, so tests and embedders redirect console output
//! by building a registry with their own streams instead of swapping globals.
//!
//! A process-wide registry is also kept for [`Config::compile`]. It is meant to
//! be configured once during startup, through [`register_writer`] and
//! [`set_outputs`], before any logger is compiled on another thread.
//!
//! [`Config::compile`]: crate::config::Config::compile

use super::error::{LoggerError, Result};
use super::writer::{SharedWriter, Sink};
use crate::config::WriterConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Built-in writer kind tags
pub mod kinds {
    pub const STDOUT: &str = "stdout";
    pub const STDERR: &str = "stderr";
    pub const FILE: &str = "file";
    pub const SYSLOG: &str = "syslog";
    pub const SYSLOG_CEE: &str = "syslog-cee";
    pub const JOURNALD: &str = "journald";
    pub const JS: &str = "js";
}

/// Builds a concrete sink from a writer entry
pub type WriterCompiler = Arc<dyn Fn(&WriterConfig) -> Result<Sink> + Send + Sync>;

/// Registry entry for one writer kind
#[derive(Clone)]
pub struct RegisteredWriter {
    compiler: WriterCompiler,
    raw_only: bool,
}

impl RegisteredWriter {
    pub fn compile(&self, config: &WriterConfig) -> Result<Sink> {
        (self.compiler)(config)
    }

    /// Whether this kind always receives raw JSON, ignoring the `format` tag
    #[must_use]
    pub fn raw_only(&self) -> bool {
        self.raw_only
    }
}

/// The two console streams the `stdout` and `stderr` kinds write to
#[derive(Debug, Clone)]
pub struct OutputSlots {
    pub stdout: SharedWriter,
    pub stderr: SharedWriter,
}

impl Default for OutputSlots {
    fn default() -> Self {
        Self {
            stdout: SharedWriter::stdout(),
            stderr: SharedWriter::stderr(),
        }
    }
}

/// Writer kind registry
///
/// # Example
///
/// ```
/// use rust_logger_config::{Config, NopWriter, Sink, WriterRegistry};
///
/// let mut registry = WriterRegistry::new();
/// registry.register("blackhole", |_| Ok(Sink::leveled(NopWriter)));
///
/// let config = Config::from_json_str(r#"{"writers": [{"type": "blackhole"}]}"#).unwrap();
/// assert!(config.compile_with(&registry).is_ok());
/// ```
pub struct WriterRegistry {
    writers: HashMap<String, RegisteredWriter>,
}

impl WriterRegistry {
    /// Registry with every built-in kind, console kinds bound to the process streams
    pub fn new() -> Self {
        Self::with_outputs(OutputSlots::default())
    }

    /// Registry with every built-in kind, console kinds bound to `outputs`
    pub fn with_outputs(outputs: OutputSlots) -> Self {
        let mut registry = Self::empty();
        registry.bind_outputs(outputs);
        registry.register_platform_defaults();
        registry
    }

    /// Registry with no kinds at all
    pub fn empty() -> Self {
        Self {
            writers: HashMap::new(),
        }
    }

    /// Point the `stdout` and `stderr` kinds at new streams
    pub fn bind_outputs(&mut self, outputs: OutputSlots) {
        let OutputSlots { stdout, stderr } = outputs;
        self.register(kinds::STDOUT, move |_| Ok(Sink::plain(stdout.clone())));
        self.register(kinds::STDERR, move |_| Ok(Sink::plain(stderr.clone())));
    }

    /// Add or replace the compiler for `kind`; the last registration wins
    pub fn register<F>(&mut self, kind: impl Into<String>, compiler: F)
    where
        F: Fn(&WriterConfig) -> Result<Sink> + Send + Sync + 'static,
    {
        self.insert(kind.into(), Arc::new(compiler), false);
    }

    /// Like [`register`](Self::register), but the kind always receives raw JSON
    /// records regardless of the entry's `format`
    pub fn register_raw<F>(&mut self, kind: impl Into<String>, compiler: F)
    where
        F: Fn(&WriterConfig) -> Result<Sink> + Send + Sync + 'static,
    {
        self.insert(kind.into(), Arc::new(compiler), true);
    }

    fn insert(&mut self, kind: String, compiler: WriterCompiler, raw_only: bool) {
        self.writers
            .insert(kind, RegisteredWriter { compiler, raw_only });
    }

    pub fn resolve(&self, kind: &str) -> Result<&RegisteredWriter> {
        self.writers
            .get(kind)
            .ok_or_else(|| LoggerError::unknown_writer(kind))
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.writers.contains_key(kind)
    }

    /// Registered kinds, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.writers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    fn register_platform_defaults(&mut self) {
        #[cfg(feature = "file")]
        self.register(kinds::FILE, compile_file);
        #[cfg(not(feature = "file"))]
        self.register(kinds::FILE, compile_unsupported);

        #[cfg(all(unix, feature = "syslog"))]
        {
            self.register(kinds::SYSLOG, compile_syslog);
            self.register(kinds::SYSLOG_CEE, compile_syslog);
        }
        #[cfg(not(all(unix, feature = "syslog")))]
        {
            self.register(kinds::SYSLOG, compile_unsupported);
            self.register(kinds::SYSLOG_CEE, compile_unsupported);
        }

        #[cfg(all(unix, feature = "journald"))]
        self.register(kinds::JOURNALD, compile_journald);
        #[cfg(not(all(unix, feature = "journald")))]
        self.register(kinds::JOURNALD, compile_unsupported);

        #[cfg(target_arch = "wasm32")]
        self.register_raw(kinds::JS, compile_js);
    }
}

impl Default for WriterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WriterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[allow(dead_code)]
fn compile_unsupported(config: &WriterConfig) -> Result<Sink> {
    Err(LoggerError::unsupported(&config.kind))
}

#[cfg(feature = "file")]
fn compile_file(config: &WriterConfig) -> Result<Sink> {
    let writer = crate::appenders::RotatingFileWriter::new(config.file.clone());
    writer.rotate()?;
    Ok(Sink::plain(writer))
}

#[cfg(all(unix, feature = "syslog"))]
fn compile_syslog(config: &WriterConfig) -> Result<Sink> {
    let writer = crate::appenders::SyslogWriter::dial(&config.syslog)?
        .with_cee(config.kind == kinds::SYSLOG_CEE);
    Ok(Sink::leveled(writer))
}

#[cfg(all(unix, feature = "journald"))]
fn compile_journald(_config: &WriterConfig) -> Result<Sink> {
    Ok(Sink::leveled(crate::appenders::JournaldWriter::new()))
}

#[cfg(target_arch = "wasm32")]
fn compile_js(_config: &WriterConfig) -> Result<Sink> {
    Ok(Sink::leveled(crate::appenders::JsConsoleWriter::new()))
}

static GLOBAL_REGISTRY: OnceLock<RwLock<WriterRegistry>> = OnceLock::new();

/// Process-wide registry used by [`Config::compile`](crate::config::Config::compile)
pub fn global_registry() -> &'static RwLock<WriterRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(WriterRegistry::new()))
}

/// Register a writer kind in the process-wide registry
pub fn register_writer<F>(kind: impl Into<String>, compiler: F)
where
    F: Fn(&WriterConfig) -> Result<Sink> + Send + Sync + 'static,
{
    global_registry().write().register(kind, compiler);
}

/// Redirect the process-wide `stdout` and `stderr` kinds
pub fn set_outputs(outputs: OutputSlots) {
    global_registry().write().bind_outputs(outputs);
}
