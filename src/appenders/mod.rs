//! Concrete sinks behind the built-in writer kinds

#[cfg(feature = "file")]
pub mod rotating_file;

#[cfg(all(unix, feature = "syslog"))]
pub mod syslog;

#[cfg(all(unix, feature = "journald"))]
pub mod journald;

#[cfg(target_arch = "wasm32")]
pub mod js_console;

#[cfg(feature = "file")]
pub use rotating_file::RotatingFileWriter;

#[cfg(all(unix, feature = "syslog"))]
pub use syslog::SyslogWriter;

#[cfg(all(unix, feature = "journald"))]
pub use journald::JournaldWriter;

#[cfg(target_arch = "wasm32")]
pub use js_console::JsConsoleWriter;
