//! # Logging
//!
//! Stores and scheduled tasks report through the [`Logger`] capability rather
//! than calling a logging framework directly, so the sink can be swapped (and
//! inspected in tests).
//!
//! - [`TracingLogger`]: forwards everything to `tracing`.
//! - [`FileLogger`]: appends JSON lines to a file and forwards to `tracing`.
//!   [`Logger::cycle_logs`] rotates the file once it grows past a threshold.
//! - [`MemoryLogger`]: keeps entries in memory.
//!
//! The `add_*` methods never fail; a sink that cannot write reports the
//! problem through `tracing` and carries on.

use crate::error::{Result, ShelfError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_LOG_GENERATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Request,
}

/// One handled request, as reported by whatever front end serves the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLog {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestLog>,
}

impl LogEntry {
    fn new(level: LogLevel, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            request: None,
        }
    }

    fn for_request(request: &RequestLog) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Request,
            message: format!("{} {} {}", request.method, request.path, request.status),
            request: Some(request.clone()),
        }
    }
}

pub trait Logger: Send + Sync {
    fn add_log(&self, message: &str);

    fn add_error_log(&self, message: &str);

    fn add_warning_log(&self, message: &str);

    fn add_request_log(&self, request: &RequestLog);

    /// Rotate or otherwise trim the log storage. A no-op for sinks without files.
    fn cycle_logs(&self) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn add_log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn add_error_log(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn add_warning_log(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn add_request_log(&self, request: &RequestLog) {
        tracing::info!(
            method = %request.method,
            path = %request.path,
            status = request.status,
            duration_ms = request.duration_ms,
            "request"
        );
    }

    fn cycle_logs(&self) -> Result<()> {
        Ok(())
    }
}

/// JSON-lines log file with size-based rotation.
///
/// Rotated generations are named `<file>.1` (newest) to `<file>.<generations>`
/// (oldest); anything older is deleted.
pub struct FileLogger {
    path: PathBuf,
    max_bytes: u64,
    generations: usize,
    // Serializes appends against rotation.
    lock: Mutex<()>,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            generations: DEFAULT_LOG_GENERATIONS,
            lock: Mutex::new(()),
        }
    }

    pub fn with_rotation(mut self, max_bytes: u64, generations: usize) -> Self {
        self.max_bytes = max_bytes;
        self.generations = generations;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn generation_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn append(&self, entry: &LogEntry) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.write_line(entry) {
            tracing::warn!("Failed to write log entry to {}: {}", self.path.display(), e);
        }
    }

    fn write_line(&self, entry: &LogEntry) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(ShelfError::Io)?;
            }
        }
        let mut line = serde_json::to_string(entry).map_err(ShelfError::Serialization)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(ShelfError::Io)?;
        file.write_all(line.as_bytes()).map_err(ShelfError::Io)?;
        Ok(())
    }
}

impl Logger for FileLogger {
    fn add_log(&self, message: &str) {
        tracing::info!("{}", message);
        self.append(&LogEntry::new(LogLevel::Info, message));
    }

    fn add_error_log(&self, message: &str) {
        tracing::error!("{}", message);
        self.append(&LogEntry::new(LogLevel::Error, message));
    }

    fn add_warning_log(&self, message: &str) {
        tracing::warn!("{}", message);
        self.append(&LogEntry::new(LogLevel::Warning, message));
    }

    fn add_request_log(&self, request: &RequestLog) {
        TracingLogger.add_request_log(request);
        self.append(&LogEntry::for_request(request));
    }

    fn cycle_logs(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(ShelfError::Io(e)),
        };
        if size <= self.max_bytes {
            return Ok(());
        }

        if self.generations == 0 {
            fs::remove_file(&self.path).map_err(ShelfError::Io)?;
            return Ok(());
        }

        let oldest = self.generation_path(self.generations);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(ShelfError::Io)?;
        }
        for n in (1..self.generations).rev() {
            let from = self.generation_path(n);
            if from.exists() {
                fs::rename(&from, self.generation_path(n + 1)).map_err(ShelfError::Io)?;
            }
        }
        fs::rename(&self.path, self.generation_path(1)).map_err(ShelfError::Io)?;
        Ok(())
    }
}

/// Keeps every entry in memory. Useful when embedding shelf in tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    fn push(&self, entry: LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

impl Logger for MemoryLogger {
    fn add_log(&self, message: &str) {
        self.push(LogEntry::new(LogLevel::Info, message));
    }

    fn add_error_log(&self, message: &str) {
        self.push(LogEntry::new(LogLevel::Error, message));
    }

    fn add_warning_log(&self, message: &str) {
        self.push(LogEntry::new(LogLevel::Warning, message));
    }

    fn add_request_log(&self, request: &RequestLog) {
        self.push(LogEntry::for_request(request));
    }

    fn cycle_logs(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_file_logger_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let logger = FileLogger::new(dir.path().join("logs").join("shelf.log"));
        logger.add_log("started");
        logger.add_warning_log("careful");
        logger.add_request_log(&RequestLog {
            method: "GET".into(),
            path: "/notes".into(),
            status: 200,
            duration_ms: 3,
            remote_addr: None,
        });

        let entries = read_entries(logger.path());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[1].message, "careful");
        assert_eq!(entries[2].message, "GET /notes 200");
        assert_eq!(entries[2].request.as_ref().unwrap().status, 200);
    }

    #[test]
    fn test_cycle_is_a_no_op_below_threshold() {
        let dir = TempDir::new().unwrap();
        let logger = FileLogger::new(dir.path().join("shelf.log")).with_rotation(1024, 3);
        logger.add_log("small");
        logger.cycle_logs().unwrap();
        assert!(logger.path().exists());
        assert!(!logger.generation_path(1).exists());
    }

    #[test]
    fn test_cycle_without_a_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let logger = FileLogger::new(dir.path().join("never-written.log"));
        logger.cycle_logs().unwrap();
    }

    #[test]
    fn test_cycle_rotates_and_caps_generations() {
        let dir = TempDir::new().unwrap();
        let logger = FileLogger::new(dir.path().join("shelf.log")).with_rotation(1, 2);

        for round in 0..4 {
            logger.add_log(&format!("round {}", round));
            logger.cycle_logs().unwrap();
        }

        assert!(!logger.path().exists());
        assert_eq!(read_entries(&logger.generation_path(1))[0].message, "round 3");
        assert_eq!(read_entries(&logger.generation_path(2))[0].message, "round 2");
        assert!(!logger.generation_path(3).exists());
    }

    #[test]
    fn test_zero_generations_discards_the_file() {
        let dir = TempDir::new().unwrap();
        let logger = FileLogger::new(dir.path().join("shelf.log")).with_rotation(1, 0);
        logger.add_log("gone soon");
        logger.cycle_logs().unwrap();
        assert!(!logger.path().exists());
        assert!(!logger.generation_path(1).exists());
    }

    #[test]
    fn test_memory_logger_counts_by_level() {
        let logger = MemoryLogger::new();
        logger.add_error_log("a");
        logger.add_error_log("b");
        logger.add_log("c");
        assert_eq!(logger.count(LogLevel::Error), 2);
        assert_eq!(logger.count(LogLevel::Info), 1);
    }
}
