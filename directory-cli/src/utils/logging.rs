use chrono::Local;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use super::dual_logging::LogFile;
use crate::config::config::LoggingConfig;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the `\logs` view
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }

    /// Parse one line of the compact formatter: "LEVEL target: message"
    pub fn parse_compact(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (level, rest) = match line.split_once(' ') {
            Some(("TRACE", rest)) => (Level::TRACE, rest),
            Some(("DEBUG", rest)) => (Level::DEBUG, rest),
            Some(("INFO", rest)) => (Level::INFO, rest),
            Some(("WARN", rest)) => (Level::WARN, rest),
            Some(("ERROR", rest)) => (Level::ERROR, rest),
            _ => return Some(Self::new(Level::INFO, "general", line.to_string())),
        };
        let rest = rest.trim_start();

        // a target has no spaces before its colon
        let (target, message) = match rest.split_once(':') {
            Some((target, message)) if !target.contains(' ') => (target, message.trim()),
            _ => ("general", rest),
        };

        Some(Self::new(level, target, message.to_string()))
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writer that feeds formatted lines to the ring buffer and, if open, the log file
#[derive(Clone)]
pub struct DualWriter {
    buffer: LogRingBuffer,
    file: Option<Arc<LogFile>>,
}

impl DualWriter {
    pub fn new(buffer: LogRingBuffer, file: Option<Arc<LogFile>>) -> Self {
        Self { buffer, file }
    }
}

impl std::io::Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for entry in text.lines().filter_map(LogEntry::parse_compact) {
                if let Some(file) = &self.file {
                    file.write_entry(&entry);
                }
                self.buffer.push(entry);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Some(file) = &self.file {
            file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DualWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Global log buffer accessible throughout the application
static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();
static LOG_FILE: OnceLock<Arc<LogFile>> = OnceLock::new();

/// Get the global log buffer
pub fn get_log_buffer() -> Option<LogRingBuffer> {
    LOG_BUFFER.get().cloned()
}

/// Path of the session log file, if file logging is on
pub fn log_file_path() -> Option<std::path::PathBuf> {
    LOG_FILE.get().map(|f| f.path().to_path_buf())
}

/// Initialize tracing with the ring buffer and, when configured, a log file.
/// RUST_LOG takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> LogRingBuffer {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let buffer = LOG_BUFFER.get_or_init(LogRingBuffer::new).clone();

    let file = if config.log_to_file {
        super::app_paths::AppPaths::log_dir()
            .ok()
            .map(|dir| LOG_FILE.get_or_init(|| Arc::new(LogFile::create_in(&dir))).clone())
    } else {
        None
    };

    let fmt_layer = fmt::layer()
        .with_writer(DualWriter::new(buffer.clone(), file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time() // entries carry their own timestamps
        .compact();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "shell", "Logging initialized");
    buffer
}
