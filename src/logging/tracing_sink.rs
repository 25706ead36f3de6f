//! # TracingSink: forwards log lines to `tracing`
//!
//! Default [`LogSink`]. Formatting and output targets are whatever
//! subscriber the embedding binary installs (e.g. `tracing_subscriber::fmt`).
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO daemonvisor: db: up tag="mydaemon"
//! WARN daemonvisor: service cache returned error: execution failed: boom tag="mydaemon"
//! ```

use std::sync::Arc;

use super::{Level, LogSink};

/// Sink writing through the `tracing` macros, target `daemonvisor`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    tag: Arc<str>,
}

impl TracingSink {
    /// Creates a sink that attaches `tag` to every event (the daemon's log tag).
    #[must_use]
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

impl LogSink for TracingSink {
    fn write(&self, level: Level, prefix: &str, message: &str) {
        let tag = &*self.tag;
        match (level, prefix.is_empty()) {
            (Level::Debug, true) => tracing::debug!(target: "daemonvisor", tag, "{message}"),
            (Level::Debug, false) => tracing::debug!(target: "daemonvisor", tag, "{prefix}: {message}"),
            (Level::Info, true) => tracing::info!(target: "daemonvisor", tag, "{message}"),
            (Level::Info, false) => tracing::info!(target: "daemonvisor", tag, "{prefix}: {message}"),
            (Level::Warn, true) => tracing::warn!(target: "daemonvisor", tag, "{message}"),
            (Level::Warn, false) => tracing::warn!(target: "daemonvisor", tag, "{prefix}: {message}"),
            (Level::Error, true) => tracing::error!(target: "daemonvisor", tag, "{message}"),
            (Level::Error, false) => tracing::error!(target: "daemonvisor", tag, "{prefix}: {message}"),
            (Level::Fatal, true) => {
                tracing::error!(target: "daemonvisor", tag, fatal = true, "{message}")
            }
            (Level::Fatal, false) => {
                tracing::error!(target: "daemonvisor", tag, fatal = true, "{prefix}: {message}")
            }
        }
    }
}
