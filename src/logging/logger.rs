//! # Logger handle and sink trait.
//!
//! A [`Logger`] bundles a shared [`LogSink`], a scope prefix and a maximum
//! level. Deriving a prefixed logger is a clone plus one string allocation,
//! so each service gets its own `Logger` scoped to its name.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use daemonvisor::{Level, LogSink, Logger};
//!
//! struct Stderr;
//!
//! impl LogSink for Stderr {
//!     fn write(&self, level: Level, prefix: &str, message: &str) {
//!         eprintln!("{level}: {prefix}: {message}");
//!     }
//! }
//!
//! let log = Logger::new(Arc::new(Stderr)).with_prefix("db");
//! log.info("listening");
//! assert_eq!(log.prefix(), "db");
//! ```

use std::fmt;
use std::sync::Arc;

use super::TracingSink;

/// Log severity.
///
/// Ordered from most to least severe; a logger configured for `Info` emits
/// `Fatal`, `Error`, `Warn` and `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Unrecoverable; [`Logger::fatal`] exits the process after writing.
    Fatal = 1,
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    /// Upper-case name, as printed by most sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for log lines.
///
/// Called synchronously from runtime and service tasks; implementations must
/// not block for long.
pub trait LogSink: Send + Sync + 'static {
    /// Writes one already-filtered line.
    ///
    /// `prefix` is empty for an undecorated logger.
    fn write(&self, level: Level, prefix: &str, message: &str);
}

/// Cheap-clone leveled logger.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    prefix: Arc<str>,
    max_level: Level,
}

impl Logger {
    /// Creates an undecorated logger at [`Level::Info`].
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            prefix: Arc::from(""),
            max_level: Level::Info,
        }
    }

    /// Returns a copy that emits everything up to `level`.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.max_level = level;
        self
    }

    /// Returns a copy whose prefix is extended by `prefix`.
    ///
    /// Nested prefixes are joined with `": "`, so `with_prefix("daemon")`
    /// then `with_prefix("db")` yields `"daemon: db"`.
    #[must_use]
    pub fn with_prefix(&self, prefix: impl AsRef<str>) -> Self {
        let prefix = prefix.as_ref();
        let joined: Arc<str> = match (self.prefix.is_empty(), prefix.is_empty()) {
            (_, true) => Arc::clone(&self.prefix),
            (true, false) => Arc::from(prefix),
            (false, false) => Arc::from(format!("{}: {prefix}", self.prefix)),
        };
        Self {
            sink: Arc::clone(&self.sink),
            prefix: joined,
            max_level: self.max_level,
        }
    }

    /// Current scope prefix (empty if undecorated).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Maximum emitted level.
    pub fn level(&self) -> Level {
        self.max_level
    }

    /// True if a line at `level` would reach the sink.
    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    /// Formats and writes `message` at `level` if enabled.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if self.enabled(level) {
            self.sink.write(level, &self.prefix, &message.to_string());
        }
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Writes `message` at [`Level::Fatal`] and exits the process with status 1.
    ///
    /// Meant for the embedding binary's setup path; the runtime never calls it.
    pub fn fatal(&self, message: impl fmt::Display) -> ! {
        self.log(Level::Fatal, message);
        std::process::exit(1)
    }
}

impl Default for Logger {
    /// Undecorated [`TracingSink`] logger at [`Level::Info`].
    fn default() -> Self {
        Logger::new(Arc::new(TracingSink::default()))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("prefix", &self.prefix)
            .field("max_level", &self.max_level)
            .finish_non_exhaustive()
    }
}
