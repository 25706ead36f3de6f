//! Error types used by the daemon runtime and by services.
//!
//! This module defines two enums:
//!
//! - [`DaemonError`] errors raised while assembling a [`Daemon`](crate::Daemon).
//! - [`ServiceError`] errors raised by a service controller or a running service.
//!
//! Both types provide `as_label` / `as_message` helpers for logs.
//! Neither is ever returned from [`Daemon::run`](crate::Daemon::run): runtime
//! failures are contained at the controller boundary and only logged.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::ServiceStatus;

/// # Errors produced while building a daemon.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaemonError {
    /// A service with the same name is already registered.
    #[error("service {name:?} is already registered")]
    DuplicateService {
        /// The conflicting registry key.
        name: String,
    },
}

impl DaemonError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use daemonvisor::DaemonError;
    ///
    /// let err = DaemonError::DuplicateService { name: "db".into() };
    /// assert_eq!(err.as_label(), "daemon_duplicate_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DaemonError::DuplicateService { .. } => "daemon_duplicate_service",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DaemonError::DuplicateService { name } => format!("duplicate service: {name}"),
        }
    }
}

/// # Errors produced by service controllers and services.
///
/// `AlreadyRunning` is a start-time condition; every other variant is a
/// runtime failure that the controller logs as a warning.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// The controller was asked to start while not `Down`.
    #[error("service is {status}")]
    AlreadyRunning {
        /// Status observed at the time of the call.
        status: ServiceStatus,
    },

    /// The service reported a failure.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The service context was cancelled by something other than a stop request.
    #[error("context cancelled: {reason}")]
    Cancelled {
        /// Why the context was cancelled (parent cancellation, deadline, ...).
        reason: Arc<str>,
    },

    /// A start/shutdown-style service did not finish `shutdown` within the grace period.
    #[error("shutdown timed out after {grace:?}")]
    ShutdownTimeout {
        /// The grace period that elapsed.
        grace: Duration,
    },

    /// The service task panicked.
    #[error("service panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Failed`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use daemonvisor::ServiceError;
    ///
    /// let err = ServiceError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        ServiceError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::AlreadyRunning { .. } => "service_already_running",
            ServiceError::Failed { .. } => "service_failed",
            ServiceError::Cancelled { .. } => "service_cancelled",
            ServiceError::ShutdownTimeout { .. } => "service_shutdown_timeout",
            ServiceError::Panicked { .. } => "service_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::AlreadyRunning { status } => format!("already running: {status}"),
            ServiceError::Failed { error } => format!("error: {error}"),
            ServiceError::Cancelled { reason } => format!("cancelled: {reason}"),
            ServiceError::ShutdownTimeout { grace } => format!("shutdown timeout: {grace:?}"),
            ServiceError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// True for conditions raised at start time rather than by a running service.
    pub fn is_start_failure(&self) -> bool {
        matches!(self, ServiceError::AlreadyRunning { .. })
    }
}
