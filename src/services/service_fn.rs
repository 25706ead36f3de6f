//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(ServiceHandle, ServiceContext) -> Fut`,
//! producing a fresh future per run. Shared state goes into an `Arc<...>`
//! captured by the closure.
//!
//! ## Example
//! ```rust
//! use daemonvisor::{ServiceContext, ServiceFn, ServiceHandle, ServiceRef};
//!
//! let svc: ServiceRef = ServiceFn::arc(|ctrl: ServiceHandle, ctx: ServiceContext| async move {
//!     ctrl.run_until_stopped(&ctx).await
//! });
//! # let _ = svc;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ServiceHandle;
use crate::error::ServiceError;
use crate::services::{Service, ServiceContext};

/// Function-backed service implementation.
pub struct ServiceFn<F> {
    f: F,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when registering directly.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the service behind an `Arc`, ready for `Daemon::add_service`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn(ServiceHandle, ServiceContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError> {
        (self.f)(ctrl, ctx).await
    }
}

impl<F> fmt::Debug for ServiceFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFn").finish_non_exhaustive()
    }
}
