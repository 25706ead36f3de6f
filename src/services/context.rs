//! # Execution context handed to running services.
//!
//! A [`ServiceContext`] is a [`CancellationToken`] plus everything a service
//! may need from its surroundings:
//! - a write-once [`StopCause`] slot telling *why* the token was cancelled,
//! - a [`ServiceLookup`] to resolve sibling services by name,
//! - a [`Logger`] scoped to the service.
//!
//! ## Cancellation cause
//! ```text
//! controller.stop()          ─► cancel(StopCause::Stopped)      ─► clean exit expected
//! ctx.abort("...")           ─► cancel(StopCause::Aborted(..))  ─► failure
//! ctx.cancel_after(d)        ─► Aborted("deadline exceeded") after d
//! parent token cancelled     ─► Aborted("parent context cancelled")
//! ```
//! The first cause observed wins; later `cancel` calls do not overwrite it.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::ServiceLookup;
use crate::error::ServiceError;
use crate::logging::Logger;
use crate::services::ServiceRef;

const PARENT_CANCELLED: &str = "parent context cancelled";
const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Why a service context was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// The supervisor asked the service to stop.
    Stopped,
    /// Anything else: parent cancellation, deadline, explicit abort.
    Aborted(Arc<str>),
}

impl StopCause {
    /// True for a voluntary stop request.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        matches!(self, StopCause::Stopped)
    }

    /// Maps the cause to a service outcome: `Stopped` is clean, anything else is
    /// [`ServiceError::Cancelled`].
    ///
    /// # Example
    /// ```
    /// use daemonvisor::StopCause;
    ///
    /// assert!(StopCause::Stopped.into_result().is_ok());
    /// assert!(StopCause::Aborted("deadline exceeded".into()).into_result().is_err());
    /// ```
    pub fn into_result(self) -> Result<(), ServiceError> {
        match self {
            StopCause::Stopped => Ok(()),
            StopCause::Aborted(reason) => Err(ServiceError::Cancelled { reason }),
        }
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCause::Stopped => f.write_str("stopped"),
            StopCause::Aborted(reason) => f.write_str(reason),
        }
    }
}

/// Cancellable execution context of one service.
///
/// Cheap to clone; clones share the token and the cause slot.
#[derive(Clone)]
pub struct ServiceContext {
    token: CancellationToken,
    cause: Arc<OnceLock<StopCause>>,
    lookup: ServiceLookup,
    logger: Logger,
}

impl ServiceContext {
    /// Creates a standalone root context with an empty service lookup.
    ///
    /// Useful for driving a service outside a [`Daemon`](crate::Daemon), e.g. in tests.
    pub fn new(logger: Logger) -> Self {
        Self::root(ServiceLookup::default(), logger)
    }

    pub(crate) fn root(lookup: ServiceLookup, logger: Logger) -> Self {
        Self {
            token: CancellationToken::new(),
            cause: Arc::new(OnceLock::new()),
            lookup,
            logger,
        }
    }

    /// Derives a child context: child token, fresh cause slot, same lookup,
    /// logger prefixed with `scope`.
    ///
    /// Cancelling the child never affects the parent.
    #[must_use]
    pub fn child(&self, scope: &str) -> Self {
        Self {
            token: self.token.child_token(),
            cause: Arc::new(OnceLock::new()),
            lookup: self.lookup.clone(),
            logger: self.logger.with_prefix(scope),
        }
    }

    /// Cancels the context with `cause`.
    ///
    /// Returns `false` if a cause had already been recorded (the token is
    /// cancelled anyway).
    pub fn cancel(&self, cause: StopCause) -> bool {
        let first = self.cause.set(cause).is_ok();
        self.token.cancel();
        first
    }

    /// Cancels with [`StopCause::Stopped`].
    pub fn stop(&self) -> bool {
        self.cancel(StopCause::Stopped)
    }

    /// Cancels with [`StopCause::Aborted`].
    pub fn abort(&self, reason: impl Into<Arc<str>>) -> bool {
        self.cancel(StopCause::Aborted(reason.into()))
    }

    /// Aborts the context with `"deadline exceeded"` once `after` elapses,
    /// unless it is cancelled first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn cancel_after(&self, after: Duration) {
        let ctx = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => { ctx.abort(DEADLINE_EXCEEDED); }
                _ = ctx.token.cancelled() => {}
            }
        });
    }

    /// True once the context is cancelled, by any means.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the cancellation cause, or `None` while still running.
    ///
    /// A token cancelled through its parent records
    /// `Aborted("parent context cancelled")` the first time it is observed.
    pub fn cause(&self) -> Option<StopCause> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(
            self.cause
                .get_or_init(|| StopCause::Aborted(Arc::from(PARENT_CANCELLED)))
                .clone(),
        )
    }

    /// Waits until the context is cancelled and returns the cause.
    pub async fn cancelled(&self) -> StopCause {
        self.token.cancelled().await;
        self.cause()
            .unwrap_or_else(|| StopCause::Aborted(Arc::from(PARENT_CANCELLED)))
    }

    /// Underlying token, for use in `tokio::select!` or to hand to sub-tasks.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Logger scoped to this service.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Sibling-service lookup handle.
    pub fn lookup(&self) -> &ServiceLookup {
        &self.lookup
    }

    /// Resolves a sibling service by name; `None` if it is not registered.
    pub fn get_service(&self, name: &str) -> Option<ServiceRef> {
        self.lookup.get(name)
    }

    /// Resolves a sibling service by name and concrete type.
    ///
    /// `None` if the name is unknown or was registered with a different type.
    pub fn get_service_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.lookup.get_as::<T>(name)
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("cancelled", &self.token.is_cancelled())
            .field("cause", &self.cause.get())
            .field("scope", &self.logger.prefix())
            .finish_non_exhaustive()
    }
}
