//! # Start/shutdown-style services.
//!
//! Some services are easier to write as a non-blocking [`start`](LifecycleService::start)
//! plus a separate [`shutdown`](LifecycleService::shutdown). The [`Lifecycle`]
//! adapter turns such a service into a run-style [`Service`] so the controller
//! drives a single shape.
//!
//! ## Flow
//! ```text
//! Lifecycle::run(ctrl, ctx)
//!   ├─► inner.start(ctx)          Err ─► return Err (never reaches Up)
//!   ├─► ctrl.mark_up()
//!   ├─► ctx.cancelled()           (stop request or abort)
//!   ├─► ctrl.mark_stopping()
//!   ├─► spawn inner.shutdown(deadline = now + grace)
//!   │       ├─ returns in time   ─► its result
//!   │       └─ grace elapsed     ─► warn "shutdown timed out", keep waiting
//!   └─► outcome: shutdown error, else stop cause
//! ```
//!
//! ## Rules
//! - The grace period bounds how long the *call* is waited on before a
//!   warning; the shutdown task is never aborted. A shutdown that never
//!   returns keeps [`Daemon::run`](crate::Daemon::run) waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::core::ServiceHandle;
use crate::error::ServiceError;
use crate::services::{Service, ServiceContext};

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Service made of a non-blocking start and a deadline-bounded shutdown.
#[async_trait]
pub trait LifecycleService: Send + Sync + 'static {
    /// Starts background work and returns promptly.
    ///
    /// Background tasks should watch `ctx` (or a clone of its token).
    async fn start(&self, ctx: ServiceContext) -> Result<(), ServiceError>;

    /// Tears the service down. Should return before `deadline`.
    async fn shutdown(&self, deadline: Deadline) -> Result<(), ServiceError>;
}

/// Point in time by which a shutdown is expected to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `grace` from now.
    ///
    /// A `grace` too large to represent (e.g. `Duration::MAX`) yields a
    /// deadline roughly 30 years out.
    pub fn after(grace: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(grace)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { at }
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Completes when the deadline is reached.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.at).await;
    }
}

/// Adapter running a [`LifecycleService`] as a [`Service`].
pub struct Lifecycle<L> {
    inner: Arc<L>,
    grace: Duration,
}

impl<L: LifecycleService> Lifecycle<L> {
    /// Wraps `inner`; `grace` bounds the shutdown call.
    pub fn new(inner: Arc<L>, grace: Duration) -> Self {
        Self { inner, grace }
    }

    pub fn inner(&self) -> &Arc<L> {
        &self.inner
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    async fn shutdown(&self, ctx: &ServiceContext) -> Result<(), ServiceError> {
        let deadline = Deadline::after(self.grace);
        let inner = Arc::clone(&self.inner);
        let mut task = tokio::spawn(async move { inner.shutdown(deadline).await });

        let joined = tokio::select! {
            res = &mut task => res,
            _ = deadline.expired() => {
                ctx.logger().warn(ServiceError::ShutdownTimeout { grace: self.grace });
                task.await
            }
        };
        joined.unwrap_or_else(|je| {
            Err(ServiceError::Panicked {
                info: je.to_string(),
            })
        })
    }
}

#[async_trait]
impl<L: LifecycleService> Service for Lifecycle<L> {
    async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError> {
        self.inner.start(ctx.clone()).await?;
        ctrl.mark_up();

        let cause = ctx.cancelled().await;
        ctrl.mark_stopping();

        self.shutdown(&ctx).await?;
        cause.into_result()
    }
}
