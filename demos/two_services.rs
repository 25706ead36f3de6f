//! Two services side by side: a run-style ticker and a start/shutdown-style
//! listener that looks the ticker up by name.
//!
//! ```text
//! cargo run --example two_services
//! ```
//! Stop it with Ctrl-C; the daemon also stops itself after 5 seconds.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use daemonvisor::{
    Daemon, Deadline, LifecycleService, Service, ServiceContext, ServiceError, ServiceHandle,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Ticker {
    ticks: AtomicU64,
}

#[async_trait]
impl Service for Ticker {
    async fn run(&self, ctrl: ServiceHandle, ctx: ServiceContext) -> Result<(), ServiceError> {
        ctrl.mark_up();
        let mut every = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                cause = ctx.cancelled() => return cause.into_result(),
                _ = every.tick() => {
                    self.ticks.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

struct Reporter {
    task: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

#[async_trait]
impl LifecycleService for Reporter {
    async fn start(&self, ctx: ServiceContext) -> Result<(), ServiceError> {
        let ticker = ctx
            .get_service_as::<Ticker>("ticker")
            .ok_or_else(|| ServiceError::fail("ticker is not registered"))?;

        let token = ctx.token().clone();
        let logger = ctx.logger().clone();
        let handle = tokio::spawn(async move {
            let mut every = tokio::time::interval(Duration::from_secs(1));
            while !token.is_cancelled() {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = every.tick() => {
                        logger.info(format_args!("ticks so far: {}", ticker.ticks.load(Ordering::Relaxed)));
                    }
                }
            }
        });
        *self.task.lock().await = Some(handle);
        Ok(())
    }

    async fn shutdown(&self, deadline: Deadline) -> Result<(), ServiceError> {
        let Some(handle) = self.task.lock().await.take() else {
            return Ok(());
        };
        tokio::select! {
            res = handle => res.map_err(ServiceError::fail),
            _ = deadline.expired() => Err(ServiceError::fail("reporter did not drain in time")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let mut daemon = Daemon::builder()
        .with_name("two_services")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_debug(true)
        .with_grace(Duration::from_secs(2))
        .build();

    daemon.add_service("ticker", Arc::new(Ticker::default()))?;
    daemon.add_lifecycle_service(
        "reporter",
        Arc::new(Reporter {
            task: tokio::sync::Mutex::new(None),
        }),
    )?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            shutdown.cancel();
        });
    }

    daemon.run(shutdown).await;
    for (name, status) in daemon.statuses() {
        println!("{name}: {status}");
    }
    Ok(())
}
