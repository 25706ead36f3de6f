//! # Daemon: service registry, startup fan-out and shutdown barrier.
//!
//! The [`Daemon`] owns the named set of [`ServiceController`]s, a [`Logger`]
//! and its [`DaemonConfig`]. [`Daemon::run`] drives one complete lifecycle.
//!
//! ## Key responsibilities
//! - publish a [`ServiceLookup`] so running services can resolve siblings by name
//! - start every controller (lexicographic order), abort startup on the first failure
//! - wait for SIGINT/SIGTERM or cancellation of the caller's shutdown token
//! - stop every controller and join all service tasks before returning
//!
//! ## High-level architecture
//! ```text
//! run(shutdown)
//!   ├─► root = ServiceContext::root(registry.lookup(), logger)
//!   ├─► barrier = TaskTracker::new()
//!   ├─► for ctrl in registry (a, b, c, ...):
//!   │       ctrl.start(&root, &barrier)
//!   │         └─ Err ─► error log, skip remaining starts, go to shutdown
//!   ├─► (all started) select! {
//!   │       wait_for_shutdown_signal()  ─► "got signal SIGTERM"
//!   │       shutdown.cancelled()        ─► "shutdown requested"
//!   │   }
//!   ├─► for ctrl in registry: ctrl.stop()       (non-blocking, StopCause::Stopped)
//!   ├─► barrier.close(); barrier.wait()          (every launched task returned)
//!   └─► "exiting"
//! ```
//!
//! ## Rules
//! - `run` has no error return; service failures are logged by their controllers.
//! - Services never outlive `run`: whatever started is stopped and joined.
//! - A daemon is meant for a single `run`; controllers are single-use, so a
//!   second `run` reports `AlreadyRunning` and returns after the shutdown steps.
//!
//! ## Example
//! ```rust,no_run
//! use daemonvisor::{Daemon, ServiceContext, ServiceFn, ServiceHandle};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut daemon = Daemon::builder().with_name("demo").build();
//!
//!     daemon.add_service(
//!         "idle",
//!         ServiceFn::arc(|ctrl: ServiceHandle, ctx: ServiceContext| async move {
//!             ctrl.run_until_stopped(&ctx).await
//!         }),
//!     )?;
//!
//!     // Returns after SIGINT/SIGTERM and full teardown.
//!     daemon.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

use std::any::Any;
use std::io;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::DaemonConfig;
use crate::core::{
    ServiceController, ServiceLookup, ServiceStatus, builder::DaemonBuilder, registry::Registry,
    shutdown,
};
use crate::error::DaemonError;
use crate::logging::Logger;
use crate::services::{Lifecycle, LifecycleService, Service, ServiceContext, ServiceRef};

/// Registry of named services plus the orchestration that runs them.
pub struct Daemon {
    cfg: DaemonConfig,
    name: String,
    logger: Logger,
    registry: Registry,
}

impl Daemon {
    /// Returns a builder.
    pub fn builder() -> DaemonBuilder {
        DaemonBuilder::new()
    }

    /// Creates a daemon from `cfg` with the default logger.
    pub fn new(cfg: DaemonConfig) -> Self {
        DaemonBuilder::new().with_config(cfg).build()
    }

    pub(crate) fn new_internal(cfg: DaemonConfig, logger: Logger) -> Self {
        Self {
            name: cfg.name(),
            cfg,
            logger,
            registry: Registry::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.cfg.version
    }

    pub fn is_debug_mode(&self) -> bool {
        self.cfg.debug
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.cfg
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Registers a run-style service under `name`.
    ///
    /// Fails with [`DaemonError::DuplicateService`] if the name is taken.
    pub fn add_service<S: Service>(
        &mut self,
        name: impl Into<String>,
        service: Arc<S>,
    ) -> Result<(), DaemonError> {
        let name: String = name.into();
        let ctrl = ServiceController::new(name, service, self.logger.clone());
        self.registry.insert(ctrl)
    }

    /// Registers a start/shutdown-style service under `name`.
    ///
    /// Its `shutdown` call is bounded by [`DaemonConfig::grace`]. Typed lookups
    /// (`get_service_as::<L>`) resolve to `service` itself, not the adapter.
    pub fn add_lifecycle_service<L: LifecycleService>(
        &mut self,
        name: impl Into<String>,
        service: Arc<L>,
    ) -> Result<(), DaemonError> {
        let name: String = name.into();
        let adapter: ServiceRef = Arc::new(Lifecycle::new(Arc::clone(&service), self.cfg.grace));
        let instance: Arc<dyn Any + Send + Sync> = service;
        let ctrl = ServiceController::from_parts(name.into(), adapter, instance, self.logger.clone());
        self.registry.insert(ctrl)
    }

    /// Returns the service registered as `name`.
    pub fn get_service(&self, name: &str) -> Option<ServiceRef> {
        self.registry.get(name).map(|c| Arc::clone(c.service()))
    }

    /// Returns the controller registered as `name`.
    pub fn controller(&self, name: &str) -> Option<Arc<ServiceController>> {
        self.registry.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn status(&self, name: &str) -> Option<ServiceStatus> {
        self.registry.get(name).map(|c| c.status())
    }

    /// `(name, status)` for every service, sorted by name.
    pub fn statuses(&self) -> Vec<(String, ServiceStatus)> {
        self.registry
            .iter()
            .map(|c| (c.name().to_string(), c.status()))
            .collect()
    }

    /// Lookup handle over the current registry.
    pub fn lookup(&self) -> ServiceLookup {
        self.registry.lookup()
    }

    /// Runs every registered service until a termination signal arrives or
    /// `shutdown` is cancelled, then stops them all and waits for each task
    /// to return.
    pub async fn run(&self, shutdown: CancellationToken) {
        self.run_until(shutdown, shutdown::wait_for_shutdown_signal())
            .await;
    }

    /// [`Daemon::run`] with the signal source supplied by the caller.
    ///
    /// `signal` resolves to the name of the received signal, or to an error if
    /// signals cannot be listened for; then only `shutdown` ends the wait.
    pub(crate) async fn run_until<F>(&self, shutdown: CancellationToken, signal: F)
    where
        F: Future<Output = io::Result<&'static str>>,
    {
        let root = ServiceContext::root(self.registry.lookup(), self.logger.clone());
        let barrier = TaskTracker::new();

        self.logger.debug(format_args!(
            "{}: starting {} service(s)",
            self.name,
            self.registry.len()
        ));

        if self.start_all(&root, &barrier) {
            self.wait_for_stop(&shutdown, signal).await;
            self.logger.info("shutting down...");
        }

        self.stop_all();
        barrier.close();
        barrier.wait().await;
        self.logger.info("exiting");
    }

    /// Starts controllers in name order; stops at the first failure.
    fn start_all(&self, root: &ServiceContext, barrier: &TaskTracker) -> bool {
        for ctrl in self.registry.iter() {
            if let Err(e) = ctrl.start(root, barrier) {
                self.logger
                    .error(format_args!("failed to start service {}: {e}", ctrl.name()));
                return false;
            }
        }
        true
    }

    fn stop_all(&self) {
        for ctrl in self.registry.iter() {
            if ctrl.stop() {
                self.logger.debug(format_args!("{}: stop requested", ctrl.name()));
            }
        }
    }

    async fn wait_for_stop<F>(&self, shutdown: &CancellationToken, signal: F)
    where
        F: Future<Output = io::Result<&'static str>>,
    {
        tokio::select! {
            res = signal => match res {
                Ok(signal) => self.logger.info(format_args!("got signal {signal}")),
                Err(e) => {
                    self.logger.error(format_args!("cannot listen for signals: {e}"));
                    shutdown.cancelled().await;
                    self.logger.info("shutdown requested");
                }
            },
            _ = shutdown.cancelled() => self.logger.info("shutdown requested"),
        }
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("name", &self.name)
            .field("version", &self.cfg.version)
            .field("services", &self.registry.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::core::ServiceHandle;
    use crate::error::ServiceError;
    use crate::logging::Level;
    use crate::logging::testing::RecordingSink;
    use crate::services::{Deadline, ServiceFn};

    fn daemon() -> (Daemon, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let d = Daemon::builder()
            .with_name("testd")
            .with_version("1.2.3")
            .with_grace(Duration::from_millis(200))
            .with_logger(Logger::new(sink.clone()))
            .build();
        (d, sink)
    }

    fn idle() -> Arc<impl Service> {
        ServiceFn::arc(|ctrl: ServiceHandle, ctx: ServiceContext| async move {
            ctrl.run_until_stopped(&ctx).await
        })
    }

    async fn wait_for(daemon: &Daemon, name: &str, status: ServiceStatus) {
        while daemon.status(name) != Some(status) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[test]
    fn test_identity_and_registration() {
        let (mut d, _sink) = daemon();
        assert_eq!(d.name(), "testd");
        assert_eq!(d.version(), "1.2.3");
        assert!(!d.is_debug_mode());

        d.add_service("b", idle()).unwrap();
        d.add_service("a", idle()).unwrap();
        let err = d.add_service("a", idle()).unwrap_err();
        assert_eq!(err.as_label(), "daemon_duplicate_service");

        assert_eq!(d.service_names(), vec!["a", "b"]);
        assert!(d.get_service("a").is_some());
        assert!(d.get_service("zzz").is_none());
        assert_eq!(
            d.statuses(),
            vec![
                ("a".to_string(), ServiceStatus::Down),
                ("b".to_string(), ServiceStatus::Down)
            ]
        );
    }

    #[test]
    fn test_debug_flag_raises_level() {
        let sink = Arc::new(RecordingSink::default());
        let d = Daemon::builder()
            .with_debug(true)
            .with_logger(Logger::new(sink))
            .build();
        assert!(d.is_debug_mode());
        assert_eq!(d.logger().level(), Level::Debug);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failing_sibling_does_not_disturb_others() {
        let (mut d, sink) = daemon();
        d.add_service("a", idle()).unwrap();
        d.add_service(
            "b",
            ServiceFn::arc(|_ctrl: ServiceHandle, _ctx: ServiceContext| async {
                Err::<(), _>(ServiceError::fail("listener crashed"))
            }),
        )
        .unwrap();
        let d = Arc::new(d);

        let shutdown = CancellationToken::new();
        let runner = {
            let d = Arc::clone(&d);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { d.run(shutdown).await })
        };

        wait_for(&d, "a", ServiceStatus::Up).await;
        wait_for(&d, "b", ServiceStatus::Stopping).await;
        assert_eq!(d.status("a"), Some(ServiceStatus::Up));

        shutdown.cancel();
        runner.await.unwrap();

        for (name, status) in d.statuses() {
            assert_eq!(status, ServiceStatus::Stopping, "{name} not stopping");
        }
        assert!(!sink.contains(Level::Info, "b: up"));
        assert_eq!(sink.count(Level::Warn), 1);
        assert!(sink.contains(Level::Warn, "service b returned error"));
        assert_eq!(sink.count(Level::Fatal), 0);
        assert_eq!(sink.count(Level::Error), 0);
        assert_eq!(sink.lines().last().unwrap().1, "exiting");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_joins_every_service() {
        const N: usize = 8;
        let (mut d, _sink) = daemon();
        let finished = Arc::new(AtomicUsize::new(0));

        for i in 0..N {
            let finished = Arc::clone(&finished);
            d.add_service(
                format!("svc-{i}"),
                ServiceFn::arc(move |ctrl: ServiceHandle, ctx: ServiceContext| {
                    let finished = Arc::clone(&finished);
                    async move {
                        let res = ctrl.run_until_stopped(&ctx).await;
                        // Slow teardown: run must still wait for it.
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        res
                    }
                }),
            )
            .unwrap();
        }

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        d.run(shutdown).await;

        assert_eq!(finished.load(Ordering::SeqCst), N);
        assert!(d.statuses().iter().all(|(_, s)| *s == ServiceStatus::Stopping));
    }

    #[tokio::test]
    async fn test_start_failure_stops_what_started() {
        let (mut d, sink) = daemon();
        d.add_service("a", idle()).unwrap();
        d.add_service("b", idle()).unwrap();
        d.add_service("c", idle()).unwrap();

        // "b" is already running outside of this run.
        let outside = TaskTracker::new();
        let b = d.controller("b").unwrap();
        b.start(&ServiceContext::new(Logger::default()), &outside).unwrap();

        // Never cancelled: run must not wait for a signal after a failed start.
        d.run(CancellationToken::new()).await;

        assert_eq!(d.status("a"), Some(ServiceStatus::Stopping));
        assert_eq!(d.status("c"), Some(ServiceStatus::Down));
        assert!(sink.contains(Level::Error, "failed to start service b: service is"));
        assert!(!sink.contains(Level::Info, "c: starting"));

        // run already fired b's trigger with a stop request.
        assert!(!b.stop());
        outside.close();
        outside.wait().await;
        assert_eq!(d.status("b"), Some(ServiceStatus::Stopping));
        assert_eq!(sink.count(Level::Warn), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_signal_stops_and_joins_everything() {
        let (mut d, sink) = daemon();
        d.add_service("a", idle()).unwrap();
        d.add_service("b", idle()).unwrap();
        let d = Arc::new(d);

        let (tx, rx) = tokio::sync::oneshot::channel::<&'static str>();
        let runner = {
            let d = Arc::clone(&d);
            tokio::spawn(async move {
                let signal = async move { rx.await.map_err(io::Error::other) };
                d.run_until(CancellationToken::new(), signal).await
            })
        };

        wait_for(&d, "a", ServiceStatus::Up).await;
        wait_for(&d, "b", ServiceStatus::Up).await;
        tx.send("SIGTERM").unwrap();
        runner.await.unwrap();

        assert!(sink.contains(Level::Info, "got signal SIGTERM"));
        assert!(!sink.contains(Level::Info, "shutdown requested"));
        assert!(sink.contains(Level::Info, "a: stopped"));
        assert!(sink.contains(Level::Info, "b: stopped"));
        assert!(d.statuses().iter().all(|(_, s)| *s == ServiceStatus::Stopping));
        assert_eq!(sink.count(Level::Warn), 0);
        assert_eq!(sink.lines().last().unwrap().1, "exiting");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_signal_setup_failure_falls_back_to_token() {
        let (mut d, sink) = daemon();
        d.add_service("a", idle()).unwrap();
        let d = Arc::new(d);

        let shutdown = CancellationToken::new();
        let runner = {
            let (d, shutdown) = (Arc::clone(&d), shutdown.clone());
            tokio::spawn(async move {
                let signal = async { Err::<&'static str, _>(io::Error::other("no signal driver")) };
                d.run_until(shutdown, signal).await
            })
        };

        while !sink.contains(Level::Error, "cannot listen for signals: no signal driver") {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        wait_for(&d, "a", ServiceStatus::Up).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!runner.is_finished());

        shutdown.cancel();
        runner.await.unwrap();

        assert!(sink.contains(Level::Info, "shutdown requested"));
        assert_eq!(d.status("a"), Some(ServiceStatus::Stopping));
        assert_eq!(sink.count(Level::Warn), 0);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let (mut d, sink) = daemon();
        d.add_service("a", idle()).unwrap();

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        d.run(shutdown.clone()).await;
        d.run(shutdown).await;

        assert!(sink.contains(Level::Error, "failed to start service a: service is stopping"));
        assert_eq!(d.status("a"), Some(ServiceStatus::Stopping));
    }

    #[tokio::test]
    async fn test_services_resolve_siblings() {
        struct Config {
            port: u16,
        }

        #[async_trait]
        impl Service for Config {
            async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError> {
                ctrl.run_until_stopped(&ctx).await
            }
        }

        let (mut d, _sink) = daemon();
        let seen = Arc::new(AtomicUsize::new(0));
        d.add_service("config", Arc::new(Config { port: 8080 })).unwrap();

        let seen_by_web = Arc::clone(&seen);
        d.add_service(
            "web",
            ServiceFn::arc(move |ctrl: ServiceHandle, ctx: ServiceContext| {
                let seen = Arc::clone(&seen_by_web);
                async move {
                    let Some(cfg) = ctx.get_service_as::<Config>("config") else {
                        return Err(ServiceError::fail("config service missing"));
                    };
                    seen.store(cfg.port as usize, Ordering::SeqCst);
                    assert!(ctx.get_service("config").is_some());
                    assert!(ctx.get_service("metrics").is_none());
                    ctrl.run_until_stopped(&ctx).await
                }
            }),
        )
        .unwrap();

        let d = Arc::new(d);
        let shutdown = CancellationToken::new();
        let runner = {
            let (d, shutdown) = (Arc::clone(&d), shutdown.clone());
            tokio::spawn(async move { d.run(shutdown).await })
        };
        wait_for(&d, "web", ServiceStatus::Up).await;
        shutdown.cancel();
        runner.await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 8080);
    }

    struct Stubborn {
        released: Arc<tokio::sync::Notify>,
        done: AtomicUsize,
    }

    #[async_trait]
    impl LifecycleService for Stubborn {
        async fn start(&self, _ctx: ServiceContext) -> Result<(), ServiceError> {
            Ok(())
        }

        async fn shutdown(&self, _deadline: Deadline) -> Result<(), ServiceError> {
            self.released.notified().await;
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_lifecycle_shutdown_warns_then_joins() {
        let (mut d, sink) = daemon();
        let released = Arc::new(tokio::sync::Notify::new());
        let stubborn = Arc::new(Stubborn {
            released: Arc::clone(&released),
            done: AtomicUsize::new(0),
        });
        d.add_lifecycle_service("stubborn", Arc::clone(&stubborn))
            .unwrap();
        assert!(d.lookup().get_as::<Stubborn>("stubborn").is_some());

        let d = Arc::new(d);
        let shutdown = CancellationToken::new();
        let runner = {
            let (d, shutdown) = (Arc::clone(&d), shutdown.clone());
            tokio::spawn(async move { d.run(shutdown).await })
        };
        wait_for(&d, "stubborn", ServiceStatus::Up).await;
        shutdown.cancel();

        // Grace is 200ms; wait for the timeout warning while shutdown is blocked.
        while !sink.contains(Level::Warn, "shutdown timed out") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!runner.is_finished());

        // The task eventually exits on its own and run returns.
        released.notify_one();
        runner.await.unwrap();

        assert_eq!(stubborn.done.load(Ordering::SeqCst), 1);
        assert_eq!(d.status("stubborn"), Some(ServiceStatus::Stopping));
        assert_eq!(sink.count(Level::Warn), 1);
    }
}
