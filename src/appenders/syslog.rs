//! Syslog writer
//!
//! Records are sent in the classic BSD framing. A blank network dials the
//! local daemon socket; otherwise `tcp`, `udp`, `unix` or `unixgram` connect
//! to `host`. The record level picks the severity while the facility bits of
//! the configured priority are kept.

use crate::config::SyslogConfig;
use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use crate::core::writer::LevelWriter;
use chrono::Local;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::time::Duration;

const LOCAL_SOCKETS: [&str; 3] = ["/dev/log", "/var/run/syslog", "/var/run/log"];
const MAX_PRIORITY: i32 = (23 << 3) | 7;
const FACILITY_MASK: i32 = 0xf8;
const SEVERITY_MASK: i32 = 0x07;
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
const CEE_COOKIE: &[u8] = b"@cee:";

/// Syslog severities
mod severity {
    pub const EMERG: i32 = 0;
    pub const CRIT: i32 = 2;
    pub const ERR: i32 = 3;
    pub const WARNING: i32 = 4;
    pub const INFO: i32 = 6;
    pub const DEBUG: i32 = 7;
}

enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
    Stream(UnixStream),
    Datagram(UnixDatagram),
}

impl Connection {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.write_all(frame),
            Connection::Stream(stream) => stream.write_all(frame),
            Connection::Udp(socket) => socket.send(frame).map(|_| ()),
            Connection::Datagram(socket) => socket.send(frame).map(|_| ()),
        }
    }
}

/// Writer connected to a syslog daemon
pub struct SyslogWriter {
    network: String,
    host: String,
    priority: i32,
    tag: String,
    hostname: String,
    pid: u32,
    cee: bool,
    conn: Mutex<Option<Connection>>,
}

impl SyslogWriter {
    /// Validate the options and connect
    pub fn dial(config: &SyslogConfig) -> Result<Self> {
        if !(0..=MAX_PRIORITY).contains(&config.flags) {
            return Err(LoggerError::config(
                "syslog",
                format!("invalid priority {}", config.flags),
            ));
        }
        match config.network.as_str() {
            "" | "tcp" | "udp" | "unix" | "unixgram" => {}
            other => {
                return Err(LoggerError::config(
                    "syslog",
                    format!("unknown network \"{}\"", other),
                ))
            }
        }

        let tag = if config.tag.is_empty() {
            default_tag()
        } else {
            config.tag.clone()
        };
        let writer = Self {
            network: config.network.clone(),
            host: config.host.clone(),
            priority: config.flags,
            tag,
            hostname: hostname(),
            pid: std::process::id(),
            cee: false,
            conn: Mutex::new(None),
        };

        let conn = writer.connect()?;
        *writer.conn.lock() = Some(conn);
        Ok(writer)
    }

    /// Prefix every message with the `@cee:` cookie
    #[must_use]
    pub fn with_cee(mut self, cee: bool) -> Self {
        self.cee = cee;
        self
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn connect(&self) -> Result<Connection> {
        let connected = match self.network.as_str() {
            "" => connect_local(),
            "tcp" => connect_tcp(&self.host),
            "udp" => connect_udp(&self.host),
            "unix" => UnixStream::connect(&self.host).map(Connection::Stream),
            "unixgram" => UnixDatagram::unbound()
                .and_then(|socket| socket.connect(&self.host).map(|_| socket))
                .map(Connection::Datagram),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown network {}", other),
            )),
        };
        connected.map_err(|e| {
            let target = if self.network.is_empty() {
                "local syslog".to_string()
            } else {
                format!("{} {}", self.network, self.host)
            };
            LoggerError::io_operation(
                "connect to syslog",
                format!("Failed to connect to {}", target),
                e,
            )
        })
    }

    fn priority_for(&self, level: LogLevel) -> i32 {
        let severity = match level {
            LogLevel::Trace | LogLevel::Debug => severity::DEBUG,
            LogLevel::Info => severity::INFO,
            LogLevel::Warn => severity::WARNING,
            LogLevel::Error => severity::ERR,
            LogLevel::Fatal => severity::EMERG,
            LogLevel::Panic => severity::CRIT,
            LogLevel::Disabled => self.priority & SEVERITY_MASK,
        };
        (self.priority & FACILITY_MASK) | severity
    }

    fn frame(&self, level: LogLevel, msg: &[u8]) -> Vec<u8> {
        let priority = self.priority_for(level);
        let header = if self.network.is_empty() {
            format!(
                "<{}>{} {}[{}]: ",
                priority,
                Local::now().format("%b %e %H:%M:%S"),
                self.tag,
                self.pid
            )
        } else {
            format!(
                "<{}>{} {} {}[{}]: ",
                priority,
                Local::now().format("%Y-%m-%dT%H:%M:%S%:z"),
                self.hostname,
                self.tag,
                self.pid
            )
        };

        let mut frame = Vec::with_capacity(header.len() + CEE_COOKIE.len() + msg.len() + 1);
        frame.extend_from_slice(header.as_bytes());
        if self.cee {
            frame.extend_from_slice(CEE_COOKIE);
        }
        frame.extend_from_slice(msg);
        if !msg.ends_with(b"\n") {
            frame.push(b'\n');
        }
        frame
    }
}

impl LevelWriter for SyslogWriter {
    fn write_level(&self, level: LogLevel, buf: &[u8]) -> Result<usize> {
        let frame = self.frame(level, buf);
        let mut conn = self.conn.lock();

        if let Some(active) = conn.as_mut() {
            if active.send(&frame).is_ok() {
                return Ok(buf.len());
            }
        }

        // one reconnect attempt per record
        *conn = None;
        let mut fresh = self.connect()?;
        fresh.send(&frame).map_err(|e| {
            LoggerError::io_operation(
                "write to syslog",
                "Failed to send record after reconnect".to_string(),
                e,
            )
        })?;
        *conn = Some(fresh);
        Ok(buf.len())
    }
}

fn connect_local() -> io::Result<Connection> {
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no local syslog socket");
    for path in LOCAL_SOCKETS {
        match UnixDatagram::unbound().and_then(|s| s.connect(path).map(|_| s)) {
            Ok(socket) => return Ok(Connection::Datagram(socket)),
            Err(e) => last_err = e,
        }
        match UnixStream::connect(path) {
            Ok(stream) => return Ok(Connection::Stream(stream)),
            Err(e) => last_err = e,
        }
    }
    Err(last_err)
}

fn resolve(host: &str) -> io::Result<SocketAddr> {
    host.to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no address for {}", host),
        )
    })
}

fn connect_tcp(host: &str) -> io::Result<Connection> {
    let stream = TcpStream::connect_timeout(&resolve(host)?, WRITE_TIMEOUT)?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
    stream.set_nodelay(true)?;
    Ok(Connection::Tcp(stream))
}

fn connect_udp(host: &str) -> io::Result<Connection> {
    let remote = resolve(host)?;
    let local = if remote.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(local)?;
    socket.connect(remote)?;
    Ok(Connection::Udp(socket))
}

fn default_tag() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().and_then(|s| s.to_str()).map(String::from))
        .unwrap_or_else(|| "app".to_string())
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
