//! # Run-style service abstraction.
//!
//! A [`Service`] has one async [`run`](Service::run) method that receives a
//! [`ServiceHandle`] (to report its own state) and a [`ServiceContext`]
//! (cancellation, sibling lookup, logger). The common handle type is
//! [`ServiceRef`], an `Arc<dyn Service>` shared between the caller and the runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ServiceHandle;
use crate::error::ServiceError;
use crate::services::ServiceContext;

/// Shared reference to a service.
pub type ServiceRef = Arc<dyn Service>;

/// # Long-lived, cancellable unit of work.
///
/// `run` should call [`ServiceHandle::mark_up`] once ready, then keep working
/// until `ctx` is cancelled or it fails. Returning `Ok(())` after a
/// [`StopCause::Stopped`](crate::StopCause::Stopped) cancellation is the
/// expected clean exit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use daemonvisor::{Service, ServiceContext, ServiceError, ServiceHandle};
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Service for Heartbeat {
///     async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError> {
///         ctrl.mark_up();
///         loop {
///             tokio::select! {
///                 cause = ctx.cancelled() => return cause.into_result(),
///                 _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {
///                     ctx.logger().debug("beat");
///                 }
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Runs the service until it is told to stop or fails.
    async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError>;
}
