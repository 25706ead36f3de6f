//! # Daemon configuration.
//!
//! Provides [`DaemonConfig`] the identity and shutdown settings of a daemon.
//! Set it through [`DaemonBuilder`](crate::DaemonBuilder) or pass a whole
//! value with `DaemonBuilder::with_config`.
//!
//! ## Sentinel values
//! - `name = ""` → basename of the running executable (`"daemon"` if unknown)
//! - `log_tag = ""` → the resolved name

use std::path::Path;
use std::time::Duration;

use crate::logging::Level;

const FALLBACK_NAME: &str = "daemon";

/// Identity and shutdown settings.
///
/// ## Field semantics
/// - `name`: daemon name used in logs (`""` = executable basename)
/// - `version`: free-form version string, reported by [`Daemon::version`](crate::Daemon::version)
/// - `log_tag`: tag attached to every log line by the default sink (`""` = name)
/// - `debug`: emit `Debug` lines
/// - `grace`: deadline for each start/shutdown-style service's `shutdown` call
///
/// ## Notes
/// All fields are public. Prefer the accessors to avoid repeating sentinel checks.
#[derive(Clone, Debug)]
pub struct DaemonConfig {
    pub name: String,
    pub version: String,
    pub log_tag: String,
    pub debug: bool,

    /// How long a start/shutdown-style service's `shutdown` may take before a
    /// timeout warning is logged.
    ///
    /// The call is not aborted when it elapses; the daemon keeps waiting for it.
    pub grace: Duration,
}

impl DaemonConfig {
    /// Returns the daemon name, resolving the empty sentinel.
    pub fn name(&self) -> String {
        if self.name.is_empty() {
            executable_name()
        } else {
            self.name.clone()
        }
    }

    /// Returns the log tag, falling back to [`DaemonConfig::name`].
    pub fn log_tag(&self) -> String {
        if self.log_tag.is_empty() {
            self.name()
        } else {
            self.log_tag.clone()
        }
    }

    /// Maximum log level implied by `debug`.
    #[inline]
    pub fn log_level(&self) -> Level {
        if self.debug { Level::Debug } else { Level::Info }
    }
}

impl Default for DaemonConfig {
    /// Default configuration:
    ///
    /// - `name = ""` (executable basename)
    /// - `version = ""`
    /// - `log_tag = ""` (same as name)
    /// - `debug = false`
    /// - `grace = 10s`
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            log_tag: String::new(),
            debug: false,
            grace: Duration::from_secs(10),
        }
    }
}

fn executable_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|argv0| Path::new(argv0).file_name())
        .map(|base| base.to_string_lossy().into_owned())
        .filter(|base| !base.is_empty())
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_resolve() {
        let cfg = DaemonConfig::default();
        assert!(!cfg.name().is_empty());
        assert_eq!(cfg.log_tag(), cfg.name());
        assert_eq!(cfg.log_level(), Level::Info);
    }

    #[test]
    fn test_explicit_values_win() {
        let cfg = DaemonConfig {
            name: "mydaemon".into(),
            log_tag: "mytag".into(),
            debug: true,
            ..DaemonConfig::default()
        };
        assert_eq!(cfg.name(), "mydaemon");
        assert_eq!(cfg.log_tag(), "mytag");
        assert_eq!(cfg.log_level(), Level::Debug);

        let untagged = DaemonConfig {
            name: "mydaemon".into(),
            ..DaemonConfig::default()
        };
        assert_eq!(untagged.log_tag(), "mydaemon");
    }
}
