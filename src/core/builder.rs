use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::DaemonConfig,
    logging::{Logger, TracingSink},
};

use super::daemon::Daemon;

/// Builder for constructing a [`Daemon`].
#[derive(Debug, Default)]
pub struct DaemonBuilder {
    cfg: DaemonConfig,
    logger: Option<Logger>,
}

impl DaemonBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: DaemonConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.cfg.name = name.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.cfg.version = version.into();
        self
    }

    /// Tag attached to log lines by the default sink.
    pub fn with_log_tag(mut self, tag: impl Into<String>) -> Self {
        self.cfg.log_tag = tag.into();
        self
    }

    /// Enables `Debug` output.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.cfg.debug = debug;
        self
    }

    /// Shutdown deadline for start/shutdown-style services.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.cfg.grace = grace;
        self
    }

    /// Injects the logger used for lifecycle events.
    ///
    /// Without one, a [`TracingSink`] tagged with the daemon's log tag is used.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the daemon.
    ///
    /// The debug flag raises the logger's level to `Debug`; it never lowers an
    /// injected logger's level.
    pub fn build(self) -> Daemon {
        let logger = self
            .logger
            .unwrap_or_else(|| Logger::new(Arc::new(TracingSink::new(self.cfg.log_tag()))));
        let logger = if self.cfg.debug {
            logger.with_level(self.cfg.log_level())
        } else {
            logger
        };
        Daemon::new_internal(self.cfg, logger)
    }
}
