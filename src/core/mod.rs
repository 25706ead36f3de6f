//! Runtime core: registry, controllers and orchestration.
//!
//! The public API from this module is [`Daemon`] (built by [`DaemonBuilder`]),
//! which owns the named services and drives their lifecycle, plus the
//! per-service [`ServiceController`] and its [`ServiceHandle`].
//!
//! Internal modules:
//! - [`daemon`]: starts every service, waits for a stop request, joins all tasks;
//! - [`controller`]: status machine and task launch for a single service;
//! - [`registry`]: name-keyed controllers and the [`ServiceLookup`] snapshot;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`builder`]: fluent construction of a [`Daemon`].

mod builder;
mod controller;
mod daemon;
mod registry;
mod shutdown;

pub use builder::DaemonBuilder;
pub use controller::{ServiceController, ServiceHandle, ServiceStatus};
pub use daemon::Daemon;
pub use registry::ServiceLookup;
