//! Shared helpers for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use rust_logger_config::{OutputSlots, SharedWriter, WriterRegistry};
use std::io::{self, Write};
use std::sync::Arc;

/// In-memory stream standing in for stdout or stderr
#[derive(Clone, Default)]
pub struct MemoryBuffer(Arc<Mutex<Vec<u8>>>);

impl MemoryBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Registry whose console kinds write into the returned buffers
pub fn captured_registry() -> (WriterRegistry, MemoryBuffer, MemoryBuffer) {
    let stdout = MemoryBuffer::default();
    let stderr = MemoryBuffer::default();
    let registry = WriterRegistry::with_outputs(OutputSlots {
        stdout: SharedWriter::new(stdout.clone()),
        stderr: SharedWriter::new(stderr.clone()),
    });
    (registry, stdout, stderr)
}
