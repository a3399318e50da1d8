//! Size-rotated log file
//!
//! The current file is written unbuffered. When a write would push it past the
//! size limit, it is renamed to `name-<timestamp>.ext` and a fresh file is
//! started. After every rotation old backups are pruned by count and age and,
//! optionally, gzip-compressed.

use crate::config::FileConfig;
use crate::core::error::{LoggerError, Result};
use crate::core::writer::ByteWriter;
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_PATTERN: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

struct FileState {
    file: Option<File>,
    size: u64,
}

/// Rotating file writer configured from a [`FileConfig`]
///
/// # Examples
///
/// ```no_run
/// use rust_logger_config::appenders::RotatingFileWriter;
/// use rust_logger_config::core::ByteWriter;
/// use rust_logger_config::FileConfig;
///
/// let writer = RotatingFileWriter::new(FileConfig {
///     filename: Some("/var/log/app/app.log".into()),
///     max_size: 10,
///     max_backups: 5,
///     compress: true,
///     ..FileConfig::default()
/// });
/// writer.rotate().unwrap();
/// writer.write(b"{\"level\":\"info\"}\n").unwrap();
/// ```
pub struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    max_age_days: u64,
    local_time: bool,
    compress: bool,
    state: Mutex<FileState>,
}

impl RotatingFileWriter {
    /// Nothing is opened until the first write or [`rotate`](Self::rotate)
    pub fn new(config: FileConfig) -> Self {
        let path = config.filename.unwrap_or_else(default_filename);
        let max_size_mb = if config.max_size == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            config.max_size
        };
        Self {
            path,
            max_bytes: max_size_mb.saturating_mul(MEGABYTE),
            max_backups: config.max_backups,
            max_age_days: config.max_age,
            local_time: config.local_time,
            compress: config.compress,
            state: Mutex::new(FileState {
                file: None,
                size: 0,
            }),
        }
    }

    /// Override the size limit with an exact byte count
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Bytes written to the current file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().size
    }

    /// Close the current file, move it aside as a backup and start a new one
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.rotate_locked(&mut state)
    }

    fn rotate_locked(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut file) = state.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }
        self.open_new(state)?;
        self.prune_backups();
        Ok(())
    }

    fn open_new(&self, state: &mut FileState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        if self.path.exists() {
            let backup = self.backup_path();
            fs::rename(&self.path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to move log file to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;
        state.file = Some(file);
        state.size = 0;
        Ok(())
    }

    fn open_existing_or_new(&self, state: &mut FileState, write_len: u64) -> Result<()> {
        let existing = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len(),
            Err(_) => return self.open_new(state),
        };
        if existing + write_len >= self.max_bytes {
            return self.rotate_locked(state);
        }

        match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => {
                state.file = Some(file);
                state.size = existing;
                Ok(())
            }
            // Unreadable leftovers are moved aside rather than blocking logging
            Err(_) => self.open_new(state),
        }
    }

    fn now(&self) -> NaiveDateTime {
        if self.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// Split `dir/app.log` into (`dir`, `app-`, `.log`)
    fn backup_parts(&self) -> (PathBuf, String, String) {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app");
        let ext = self
            .path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (dir, format!("{}-", stem), ext)
    }

    fn backup_path(&self) -> PathBuf {
        let (dir, prefix, ext) = self.backup_parts();
        let stamp = self.now().format(BACKUP_TIME_PATTERN);
        dir.join(format!("{}{}{}", prefix, stamp, ext))
    }

    /// Rotated files, newest first
    fn backups(&self) -> Vec<(NaiveDateTime, PathBuf)> {
        let (dir, prefix, ext) = self.backup_parts();
        let listing_dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir.clone()
        };
        let Ok(entries) = fs::read_dir(&listing_dir) else {
            return Vec::new();
        };

        let compressed_ext = format!("{}{}", ext, COMPRESS_SUFFIX);
        let mut backups: Vec<(NaiveDateTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let rest = name.strip_prefix(&prefix)?;
                let stamp = rest
                    .strip_suffix(&compressed_ext)
                    .or_else(|| rest.strip_suffix(&ext))?;
                let at = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_PATTERN).ok()?;
                Some((at, dir.join(&name)))
            })
            .collect();
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        backups
    }

    fn prune_backups(&self) {
        if self.max_backups == 0 && self.max_age_days == 0 && !self.compress {
            return;
        }

        let mut remaining = self.backups();
        let mut expired = Vec::new();

        if self.max_backups > 0 {
            let mut kept_stamps: Vec<NaiveDateTime> = Vec::new();
            let mut kept = Vec::new();
            for (at, path) in remaining {
                // a backup and its compressed twin count once
                if kept_stamps.contains(&at) || kept_stamps.len() < self.max_backups {
                    if !kept_stamps.contains(&at) {
                        kept_stamps.push(at);
                    }
                    kept.push((at, path));
                } else {
                    expired.push(path);
                }
            }
            remaining = kept;
        }

        if self.max_age_days > 0 {
            let days = i64::try_from(self.max_age_days).unwrap_or(i64::MAX / 86_400);
            let cutoff = self.now() - ChronoDuration::days(days);
            let (fresh, stale): (Vec<_>, Vec<_>) =
                remaining.into_iter().partition(|(at, _)| *at >= cutoff);
            expired.extend(stale.into_iter().map(|(_, path)| path));
            remaining = fresh;
        }

        for path in expired {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("[WARN] Failed to remove old log file {}: {}", path.display(), e);
            }
        }

        if self.compress {
            for (_, path) in remaining {
                let is_compressed = path
                    .to_str()
                    .map(|p| p.ends_with(COMPRESS_SUFFIX))
                    .unwrap_or(true);
                if !is_compressed {
                    if let Err(e) = compress_file(&path) {
                        eprintln!("[WARN] Failed to compress {}: {}", path.display(), e);
                    }
                }
            }
        }
    }
}

impl ByteWriter for RotatingFileWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let write_len = buf.len() as u64;
        if write_len > self.max_bytes {
            return Err(LoggerError::file_appender(
                self.path.display().to_string(),
                format!(
                    "write length {} exceeds maximum file size {}",
                    write_len, self.max_bytes
                ),
            ));
        }

        let mut state = self.state.lock();
        if state.file.is_none() {
            self.open_existing_or_new(&mut state, write_len)?;
        }
        if state.size + write_len > self.max_bytes {
            self.rotate_locked(&mut state)?;
        }

        let file = state
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        file.write_all(buf).map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        state.size += write_len;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_mut() {
            file.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

fn default_filename() -> PathBuf {
    let exe = std::env::current_exe()
        .ok()
        .and_then(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
        .unwrap_or_else(|| "app".to_string());
    std::env::temp_dir().join(format!("{}-rotating.log", exe))
}

/// Gzip `path` into `path.gz`, removing the source only once the archive is complete
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, BufWriter};

    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(COMPRESS_SUFFIX);
    let gz_path = PathBuf::from(gz_name);
    let mut tmp_name = gz_path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let temp_gz_path = PathBuf::from(tmp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!(
                "Failed to create temporary compressed file: {}",
                temp_gz_path.display()
            ),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let copied = std::io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut out| out.flush());
    if let Err(e) = copied {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove source file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}
