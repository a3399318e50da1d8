//! Browser console writer for wasm32 targets
//!
//! The record message is passed as the first console argument and the
//! remaining fields as a JavaScript object, so devtools render them inspectable.

use crate::core::error::Result;
use crate::core::log_level::LogLevel;
use crate::core::writer::LevelWriter;
use serde_json::{Map, Value};
use wasm_bindgen::JsValue;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsConsoleWriter;

impl JsConsoleWriter {
    pub fn new() -> Self {
        Self
    }
}

impl LevelWriter for JsConsoleWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        let trimmed = buf.strip_suffix(b"\n").unwrap_or(buf);
        let Ok(mut fields) = serde_json::from_slice::<Map<String, Value>>(trimmed) else {
            web_sys::console::log_1(&JsValue::from_str(&String::from_utf8_lossy(trimmed)));
            return Ok(buf.len());
        };

        fields.remove("level");
        let message = match fields.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let rest = serde_json::to_string(&fields)?;
        let object = js_sys::JSON::parse(&rest).unwrap_or_else(|_| JsValue::from_str(&rest));
        let message = JsValue::from_str(&message);

        match level {
            LogLevel::Trace => web_sys::console::debug_2(&message, &object),
            LogLevel::Debug => web_sys::console::log_2(&message, &object),
            LogLevel::Info => web_sys::console::info_2(&message, &object),
            LogLevel::Warn => web_sys::console::warn_2(&message, &object),
            _ => web_sys::console::error_2(&message, &object),
        }
        Ok(buf.len())
    }
}
