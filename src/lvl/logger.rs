use std::{collections::VecDeque, fmt, sync::Mutex};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// One diagnostic produced while loading a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerEntry {
    pub level: LogLevel,
    /// File name of the level that produced the entry.
    pub file: String,
    pub message: String,
}

impl LoggerEntry {
    pub fn new(level: LogLevel, file: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerEntry {
            level,
            file: file.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoggerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.file, self.message)
    }
}

/// FIFO of log entries shared between the loader jobs (producers) and the
/// thread polling the container (consumer).
#[derive(Default)]
pub struct LogQueue {
    entries: Mutex<VecDeque<LoggerEntry>>,
}

impl LogQueue {
    pub fn push(&self, entry: LoggerEntry) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push_back(entry);
    }

    pub fn pop(&self) -> Option<LoggerEntry> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.pop_front()
    }
}
