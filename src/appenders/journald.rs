//! systemd journal writer
//!
//! Each JSON record becomes one datagram in the journal's native protocol:
//! `MESSAGE` and `PRIORITY` come from the record, every other top-level field
//! is sent under its upper-cased name, and the untouched record goes in `JSON`.
//! Records too large for one datagram are written to a sealed memfd whose
//! descriptor is passed to the journal instead.

use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use crate::core::writer::LevelWriter;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};

const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";
const SKIPPED_FIELDS: [&str; 3] = ["level", "time", "message"];

/// Writer for the local systemd journal
pub struct JournaldWriter {
    socket_path: PathBuf,
    socket: Mutex<Option<UnixDatagram>>,
}

impl JournaldWriter {
    /// Writer for the default journal socket; nothing is opened until the first record
    pub fn new() -> Self {
        Self::with_socket_path(JOURNAL_SOCKET)
    }

    pub fn with_socket_path(path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
            socket: Mutex::new(None),
        }
    }

    fn send(&self, datagram: &[u8]) -> Result<()> {
        let mut socket = self.socket.lock();
        if socket.is_none() {
            *socket = Some(UnixDatagram::unbound()?);
        }
        let Some(sock) = socket.as_ref() else {
            return Err(LoggerError::writer("journal socket not initialized"));
        };
        let sent = match sock.send_to(datagram, &self.socket_path) {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Err(e) if is_oversized(&e) => memfd::send(sock, &self.socket_path, datagram),
            other => other.map(|_| ()),
        };
        sent.map_err(|e| {
            LoggerError::io_operation(
                "write to journald",
                format!("Failed to send to {}", self.socket_path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

impl Default for JournaldWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelWriter for JournaldWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        self.send(&encode(level, buf))?;
        Ok(buf.len())
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn is_oversized(e: &std::io::Error) -> bool {
    use nix::errno::Errno;
    matches!(
        e.raw_os_error(),
        Some(code) if code == Errno::EMSGSIZE as i32 || code == Errno::ENOBUFS as i32
    )
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod memfd {
    use nix::fcntl::{fcntl, FcntlArg, SealFlag};
    use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
    use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags, UnixAddr};
    use std::ffi::CString;
    use std::fs::File;
    use std::io::{self, Write};
    use std::os::fd::{AsRawFd, OwnedFd};
    use std::os::unix::net::UnixDatagram;
    use std::path::Path;

    /// Copy `data` into an anonymous file sealed against further changes
    pub(super) fn sealed(data: &[u8]) -> io::Result<OwnedFd> {
        let name = CString::new("journal-record")?;
        let fd = memfd_create(
            name.as_c_str(),
            MemFdCreateFlag::MFD_ALLOW_SEALING | MemFdCreateFlag::MFD_CLOEXEC,
        )?;
        let mut file = File::from(fd);
        file.write_all(data)?;
        fcntl(
            file.as_raw_fd(),
            FcntlArg::F_ADD_SEALS(
                SealFlag::F_SEAL_SHRINK
                    | SealFlag::F_SEAL_GROW
                    | SealFlag::F_SEAL_WRITE
                    | SealFlag::F_SEAL_SEAL,
            ),
        )?;
        Ok(OwnedFd::from(file))
    }

    /// Pass the payload as an `SCM_RIGHTS` descriptor with an empty datagram
    pub(super) fn send(socket: &UnixDatagram, path: &Path, data: &[u8]) -> io::Result<()> {
        let fd = sealed(data)?;
        let addr = UnixAddr::new(path)?;
        let fds = [fd.as_raw_fd()];
        sendmsg(
            socket.as_raw_fd(),
            &[],
            &[ControlMessage::ScmRights(&fds)],
            MsgFlags::empty(),
            Some(&addr),
        )?;
        Ok(())
    }
}

fn priority(level: LogLevel) -> u8 {
    match level {
        LogLevel::Trace | LogLevel::Debug => 7,
        LogLevel::Info => 6,
        LogLevel::Warn => 4,
        LogLevel::Error => 3,
        LogLevel::Fatal => 2,
        LogLevel::Panic => 0,
        LogLevel::Disabled => 5,
    }
}

/// Build one native-protocol datagram
fn encode(level: LogLevel, record: &[u8]) -> Vec<u8> {
    let trimmed = record.strip_suffix(b"\n").unwrap_or(record);
    let mut out = Vec::with_capacity(record.len() * 2 + 32);

    let Ok(fields) = serde_json::from_slice::<Map<String, Value>>(trimmed) else {
        push_field(&mut out, "MESSAGE", trimmed);
        push_field(&mut out, "PRIORITY", priority(level).to_string().as_bytes());
        return out;
    };

    let message = match fields.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    push_field(&mut out, "MESSAGE", message.as_bytes());
    push_field(&mut out, "PRIORITY", priority(level).to_string().as_bytes());

    for (key, value) in &fields {
        if SKIPPED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let name = field_name(key);
        if matches!(name.as_str(), "MESSAGE" | "PRIORITY" | "JSON") {
            continue;
        }
        match value {
            Value::String(s) => push_field(&mut out, &name, s.as_bytes()),
            other => push_field(&mut out, &name, other.to_string().as_bytes()),
        }
    }
    push_field(&mut out, "JSON", trimmed);
    out
}

/// Journal field names are `[A-Z0-9_]` and may not start with `_` or a digit
fn field_name(key: &str) -> String {
    let mapped: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    let name = mapped.trim_start_matches('_');
    match name.chars().next() {
        None => "FIELD".to_string(),
        Some(c) if c.is_ascii_digit() => format!("F_{}", name),
        Some(_) => name.to_string(),
    }
}

fn push_field(out: &mut Vec<u8>, name: &str, value: &[u8]) {
    out.extend_from_slice(name.as_bytes());
    if value.contains(&b'\n') {
        out.push(b'\n');
        out.extend_from_slice(&(value.len() as u64).to_le_bytes());
        out.extend_from_slice(value);
    } else {
        out.push(b'=');
        out.extend_from_slice(value);
    }
    out.push(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn text(datagram: &[u8]) -> String {
        String::from_utf8_lossy(datagram).into_owned()
    }

    #[test]
    fn test_encodes_record_fields() {
        let record = b"{\"level\":\"warn\",\"time\":\"2024-01-01T00:00:00.000Z\",\"request-id\":\"r1\",\"count\":3,\"message\":\"slow\"}\n";
        let encoded = text(&encode(LogLevel::Warn, record));

        assert!(encoded.starts_with("MESSAGE=slow\nPRIORITY=4\n"));
        assert!(encoded.contains("\nREQUEST_ID=r1\n"));
        assert!(encoded.contains("\nCOUNT=3\n"));
        assert!(!encoded.contains("LEVEL="));
        assert!(!encoded.contains("TIME="));
        assert!(encoded.ends_with(&format!(
            "JSON={}\n",
            std::str::from_utf8(&record[..record.len() - 1]).unwrap()
        )));
    }

    #[test]
    fn test_multiline_values_use_length_prefix() {
        let mut out = Vec::new();
        push_field(&mut out, "MESSAGE", b"line one\nline two");

        let mut expected = b"MESSAGE\n".to_vec();
        expected.extend_from_slice(&17u64.to_le_bytes());
        expected.extend_from_slice(b"line one\nline two\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_non_json_payload_sent_as_message() {
        let encoded = text(&encode(LogLevel::Error, b"plain text\n"));
        assert_eq!(encoded, "MESSAGE=plain text\nPRIORITY=3\n");
    }

    #[test]
    fn test_priorities() {
        assert_eq!(priority(LogLevel::Trace), 7);
        assert_eq!(priority(LogLevel::Info), 6);
        assert_eq!(priority(LogLevel::Fatal), 2);
        assert_eq!(priority(LogLevel::Panic), 0);
    }

    #[test]
    fn test_field_names_sanitized() {
        assert_eq!(field_name("user.id"), "USER_ID");
        assert_eq!(field_name("_private"), "PRIVATE");
        assert_eq!(field_name("2fa"), "F_2FA");
        assert_eq!(field_name("__"), "FIELD");
    }

    #[test]
    fn test_sends_to_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.sock");
        let server = UnixDatagram::bind(&path).unwrap();
        server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let writer = JournaldWriter::with_socket_path(&path);
        let record = b"{\"level\":\"info\",\"message\":\"ready\"}\n";
        assert_eq!(writer.write_level(LogLevel::Info, record).unwrap(), record.len());

        let mut buf = [0u8; 1024];
        let n = server.recv(&mut buf).unwrap();
        assert!(text(&buf[..n]).starts_with("MESSAGE=ready\nPRIORITY=6\n"));
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_oversized_record_sent_through_memfd() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("journal.sock");
        let server = UnixDatagram::bind(&path).unwrap();
        server.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let writer = JournaldWriter::with_socket_path(&path);
        let record = format!(
            "{{\"level\":\"info\",\"message\":\"{}\"}}\n",
            "x".repeat(1024 * 1024)
        );
        assert_eq!(
            writer.write_level(LogLevel::Info, record.as_bytes()).unwrap(),
            record.len()
        );

        // the payload travels in the descriptor, the datagram itself is empty
        let mut buf = [0u8; 64];
        assert_eq!(server.recv(&mut buf).unwrap(), 0);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_sealed_memfd_holds_payload() {
        use std::io::{Read, Seek, SeekFrom, Write};

        let payload = encode(LogLevel::Warn, b"{\"message\":\"big\"}\n");
        let mut file = std::fs::File::from(memfd::sealed(&payload).unwrap());
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, payload);
        assert!(file.write_all(b"more").is_err(), "memfd is sealed");
    }

    #[test]
    fn test_missing_socket_reports_error() {
        let dir = tempdir().unwrap();
        let writer = JournaldWriter::with_socket_path(dir.path().join("absent.sock"));
        assert!(writer.write_level(LogLevel::Info, b"{}\n").is_err());
    }
}
