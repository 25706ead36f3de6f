//! # ServiceController: owns the execution of one service.
//!
//! ## State machine
//! ```text
//!   Down ──start()──► Starting ──mark_up()──► Up ──(run returns)──► Stopping
//!                         │                                            ▲
//!                         └──────────(run returns before Up)───────────┘
//! ```
//!
//! ## Start protocol
//! ```text
//! start(parent, barrier)
//!   ├─ lock; status != Down ─► Err(AlreadyRunning{status}), no side effects
//!   ├─ status = Starting
//!   ├─ ctx = parent.child(name); trigger = Some(ctx)
//!   ├─ unlock
//!   └─ barrier.spawn(execute(ctx))
//!          ├─► service.run(handle, ctx)      (panics caught)
//!          ├─► Err ─► warn
//!          └─► lock; trigger = None; status = Stopping
//! ```
//!
//! ## Rules
//! - `status` and `trigger` are only touched under the controller's own mutex.
//! - `trigger` is present while the task runs and no stop was requested.
//! - `stop()` never blocks on the task; the join barrier does that.
//! - A controller runs at most once; there is no transition out of `Stopping`.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio_util::task::TaskTracker;

use crate::error::ServiceError;
use crate::logging::Logger;
use crate::services::{Service, ServiceContext, ServiceRef, StopCause};

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceStatus {
    /// Registered, never started.
    #[default]
    Down,
    /// Task launched, service not ready yet.
    Starting,
    /// Service reported itself ready.
    Up,
    /// Service is winding down or has returned. Terminal.
    Stopping,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Down => "down",
            ServiceStatus::Starting => "starting",
            ServiceStatus::Up => "up",
            ServiceStatus::Stopping => "stopping",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct State {
    status: ServiceStatus,
    trigger: Option<ServiceContext>,
}

/// Per-service record: name, service instance, status and stop trigger.
pub struct ServiceController {
    name: Arc<str>,
    service: ServiceRef,
    instance: Arc<dyn Any + Send + Sync>,
    logger: Logger,
    state: Mutex<State>,
}

impl ServiceController {
    /// Creates a `Down` controller for `service`.
    pub fn new<S: Service>(name: impl Into<Arc<str>>, service: Arc<S>, logger: Logger) -> Self {
        let instance: Arc<dyn Any + Send + Sync> = service.clone();
        Self::from_parts(name.into(), service, instance, logger)
    }

    /// `instance` is what typed lookups downcast; it differs from `service`
    /// when the service is wrapped in an adapter.
    pub(crate) fn from_parts(
        name: Arc<str>,
        service: ServiceRef,
        instance: Arc<dyn Any + Send + Sync>,
        logger: Logger,
    ) -> Self {
        Self {
            name,
            service,
            instance,
            logger,
            state: Mutex::new(State {
                status: ServiceStatus::Down,
                trigger: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered service.
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    pub(crate) fn instance(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.instance
    }

    pub fn status(&self) -> ServiceStatus {
        self.lock().status
    }

    /// True while a stop trigger is armed.
    pub fn is_running(&self) -> bool {
        self.lock().trigger.is_some()
    }

    /// Marks the service `Up`. Ignored once `Stopping`.
    pub fn mark_up(&self) {
        let mut st = self.lock();
        if st.status == ServiceStatus::Stopping {
            self.logger
                .debug(format_args!("{}: ignoring up, already stopping", self.name));
            return;
        }
        st.status = ServiceStatus::Up;
        self.logger.info(format_args!("{}: up", self.name));
    }

    /// Marks the service `Stopping`.
    pub fn mark_stopping(&self) {
        let mut st = self.lock();
        st.status = ServiceStatus::Stopping;
        self.logger.info(format_args!("{}: stopping", self.name));
    }

    /// Launches the service task on `barrier`.
    ///
    /// Fails with [`ServiceError::AlreadyRunning`] unless the controller is
    /// `Down`; in that case nothing is spawned or registered.
    pub fn start(
        self: &Arc<Self>,
        parent: &ServiceContext,
        barrier: &TaskTracker,
    ) -> Result<(), ServiceError> {
        let ctx = {
            let mut st = self.lock();
            if st.status != ServiceStatus::Down {
                return Err(ServiceError::AlreadyRunning { status: st.status });
            }
            self.logger.info(format_args!("{}: starting...", self.name));
            st.status = ServiceStatus::Starting;

            let ctx = parent.child(&self.name);
            st.trigger = Some(ctx.clone());
            ctx
        };

        let me = Arc::clone(self);
        barrier.spawn(async move { me.execute(ctx).await });
        Ok(())
    }

    /// Cancels the running task with [`StopCause::Stopped`].
    ///
    /// Returns `false` (and does nothing) when no trigger is armed.
    pub fn stop(&self) -> bool {
        let trigger = self.lock().trigger.take();
        match trigger {
            Some(ctx) => {
                ctx.cancel(StopCause::Stopped);
                true
            }
            None => false,
        }
    }

    async fn execute(self: Arc<Self>, ctx: ServiceContext) {
        let handle = ServiceHandle {
            ctrl: Arc::clone(&self),
        };
        let outcome = AssertUnwindSafe(self.service.run(handle, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ServiceError::Panicked {
                    info: panic_message(payload.as_ref()),
                })
            });

        if let Err(e) = &outcome {
            self.logger
                .warn(format_args!("service {} returned error: {e}", self.name));
        }

        let mut st = self.lock();
        if let Some(ctx) = st.trigger.take() {
            // Releases sub-tasks and deadline watchers still parked on the token.
            ctx.cancel(StopCause::Stopped);
        }
        st.status = ServiceStatus::Stopping;
        self.logger.info(format_args!("{}: stopped", self.name));
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ServiceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceController")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The part of a controller a running service may touch.
#[derive(Clone)]
pub struct ServiceHandle {
    ctrl: Arc<ServiceController>,
}

impl ServiceHandle {
    pub fn name(&self) -> &str {
        self.ctrl.name()
    }

    pub fn status(&self) -> ServiceStatus {
        self.ctrl.status()
    }

    /// See [`ServiceController::mark_up`].
    pub fn mark_up(&self) {
        self.ctrl.mark_up();
    }

    /// Reports that the service is winding down on its own.
    pub fn mark_stopping(&self) {
        self.ctrl.mark_stopping();
    }

    /// Marks the service `Up`, then waits for cancellation.
    ///
    /// Returns `Ok(())` for a stop request and [`ServiceError::Cancelled`]
    /// for any other cause (parent cancellation, deadline, abort).
    pub async fn run_until_stopped(&self, ctx: &ServiceContext) -> Result<(), ServiceError> {
        self.mark_up();
        ctx.cancelled().await.into_result()
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceHandle").field(&self.ctrl.name).finish()
    }
}
