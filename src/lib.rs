//! # daemonvisor
//!
//! **Daemonvisor** runs a fixed set of named, long-lived services inside one
//! process and drives their lifecycle from startup to a coordinated,
//! signal-triggered shutdown.
//!
//! It tracks every service's status, tells a service that was *asked to stop*
//! apart from one that *failed*, and guarantees that [`Daemon::run`] does not
//! return until every service it launched has returned.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//!     │   Service    │   │  ServiceFn   │   │  LifecycleService    │
//!     │ (run-style)  │   │  (closure)   │   │ (start/shutdown)     │
//!     └──────┬───────┘   └──────┬───────┘   └──────────┬───────────┘
//!            │                  │                      ▼
//!            │                  │           Lifecycle adapter (grace)
//!            ▼                  ▼                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Daemon (registry + orchestrator)                                 │
//! │  - Registry (name → ServiceController, lexicographic order)       │
//! │  - ServiceLookup (read-only snapshot handed to services)          │
//! │  - Logger (leveled, pluggable LogSink)                            │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │ Controller a  │  │ Controller b  │  │ Controller c  │
//!  │ status+trigger│  │ status+trigger│  │ status+trigger│
//!  └──────┬────────┘  └──────┬────────┘  └──────┬────────┘
//!         ▼                  ▼                  ▼
//!    run(handle, ctx)   run(handle, ctx)   run(handle, ctx)
//!         │                  │                  │
//!         └──────────────────┼──────────────────┘
//!                            ▼
//!               TaskTracker (join barrier)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Daemon::run(shutdown)
//!   ├─► start every controller
//!   │       Down ──► Starting ──mark_up()──► Up
//!   │       └─ start error ─► log error, skip the wait
//!   ├─► wait: SIGINT / SIGTERM / shutdown.cancel()
//!   ├─► stop every controller ─► ctx cancelled with StopCause::Stopped
//!   │       service returns ─► Stopping
//!   │           ├─ Ok             ─► clean stop
//!   │           ├─ Err(Cancelled) ─► cancelled for another reason, warn
//!   │           └─ Err / panic    ─► failure, warn
//!   └─► wait for every service task, "exiting"
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Orchestration** | Register, start, stop and join a set of named services.       | [`Daemon`], [`DaemonBuilder`]                   |
//! | **Services**      | Run-style and start/shutdown-style services, closures.        | [`Service`], [`LifecycleService`], [`ServiceFn`]|
//! | **Cancellation**  | Cancellation with an explicit, first-wins cause.              | [`ServiceContext`], [`StopCause`]               |
//! | **Status**        | Per-service state machine, observable at any time.            | [`ServiceController`], [`ServiceStatus`]        |
//! | **Lookup**        | Resolve sibling services by name, optionally typed.           | [`ServiceLookup`]                               |
//! | **Logging**       | Leveled lifecycle output through a pluggable sink.            | [`Logger`], [`LogSink`], [`TracingSink`]        |
//! | **Errors**        | Typed errors for registration and service execution.          | [`DaemonError`], [`ServiceError`]               |
//! | **Configuration** | Identity and shutdown grace period.                           | [`DaemonConfig`]                                |
//!
//! ## Example
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use daemonvisor::{Daemon, ServiceContext, ServiceFn, ServiceHandle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut daemon = Daemon::builder()
//!         .with_name("hello")
//!         .with_version(env!("CARGO_PKG_VERSION"))
//!         .with_grace(Duration::from_secs(5))
//!         .build();
//!
//!     // Ticks until asked to stop.
//!     daemon.add_service(
//!         "ticker",
//!         ServiceFn::arc(|ctrl: ServiceHandle, ctx: ServiceContext| async move {
//!             ctrl.mark_up();
//!             loop {
//!                 tokio::select! {
//!                     cause = ctx.cancelled() => return cause.into_result(),
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         ctx.logger().info("tick");
//!                     }
//!                 }
//!             }
//!         }),
//!     )?;
//!
//!     // Blocks until SIGINT/SIGTERM, then stops and joins every service.
//!     daemon.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod logging;
mod services;

// ---- Public re-exports ----

pub use config::DaemonConfig;
pub use self::core::{
    Daemon, DaemonBuilder, ServiceController, ServiceHandle, ServiceLookup, ServiceStatus,
};
pub use error::{DaemonError, ServiceError};
pub use logging::{Level, LogSink, Logger, TracingSink};
pub use services::{
    Deadline, Lifecycle, LifecycleService, Service, ServiceContext, ServiceFn, ServiceRef,
    StopCause,
};
