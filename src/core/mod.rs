//! Core logger types and traits

pub mod error;
pub mod event;
pub mod fan_out;
pub mod level_window;
pub mod log_level;
pub mod logger;
pub mod pretty;
pub mod registry;
pub mod timestamp;
pub mod writer;

pub use error::{LoggerError, Result};
pub use event::Event;
pub use fan_out::{fan_out, MultiLevelWriter, NopWriter};
pub use level_window::LevelWindowWriter;
pub use log_level::LogLevel;
pub use logger::Logger;
pub use pretty::PrettyWriter;
pub use registry::{
    global_registry, kinds, register_writer, set_outputs, OutputSlots, RegisteredWriter,
    WriterCompiler, WriterRegistry,
};
pub use timestamp::TimestampFormat;
pub use writer::{ByteWriter, LevelWriter, PlainAdapter, SharedWriter, Sink};
