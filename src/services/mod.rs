//! # Service abstractions.
//!
//! This module provides the service-side types:
//! - [`Service`] - run-style trait (one async `run`)
//! - [`LifecycleService`] - start/shutdown-style trait, adapted by [`Lifecycle`]
//! - [`ServiceFn`] - closure-backed service
//! - [`ServiceContext`] / [`StopCause`] - cancellation with an explicit cause
//! - [`ServiceRef`] - shared reference (`Arc<dyn Service>`)

mod context;
mod lifecycle;
mod service;
mod service_fn;

pub use context::{ServiceContext, StopCause};
pub use lifecycle::{Deadline, Lifecycle, LifecycleService};
pub use service::{Service, ServiceRef};
pub use service_fn::ServiceFn;
