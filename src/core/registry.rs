//! # Service registry and lookup handle.
//!
//! [`Registry`] maps service names to their controllers. It is populated from
//! a single-threaded setup path and read-only afterwards, so it needs no lock.
//! Iteration is lexicographic by name (`BTreeMap`), which keeps start order
//! and log output deterministic.
//!
//! [`ServiceLookup`] is the read-only snapshot handed to running services
//! through their [`ServiceContext`](crate::ServiceContext).
//!
//! ```text
//! Daemon ── owns ──► Registry { name → Arc<ServiceController> }
//!                         │ lookup()
//!                         ▼
//!                 ServiceLookup (Arc snapshot) ──► ServiceContext ──► services
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

use crate::core::ServiceController;
use crate::error::DaemonError;
use crate::services::ServiceRef;

/// Name-keyed set of controllers.
#[derive(Default)]
pub(crate) struct Registry {
    services: BTreeMap<String, Arc<ServiceController>>,
}

impl Registry {
    /// Adds a controller under its own name.
    ///
    /// Duplicate names are rejected; the existing controller is left untouched.
    pub(crate) fn insert(&mut self, ctrl: ServiceController) -> Result<(), DaemonError> {
        match self.services.entry(ctrl.name().to_string()) {
            Entry::Occupied(e) => Err(DaemonError::DuplicateService {
                name: e.key().clone(),
            }),
            Entry::Vacant(e) => {
                e.insert(Arc::new(ctrl));
                Ok(())
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<ServiceController>> {
        self.services.get(name)
    }

    /// Controllers in lexicographic name order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<ServiceController>> {
        self.services.values()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    /// Snapshot for running services.
    pub(crate) fn lookup(&self) -> ServiceLookup {
        ServiceLookup {
            services: Arc::new(self.services.clone()),
        }
    }
}

/// Resolve-by-name handle published to running services.
///
/// Absent names yield `None`; callers must tolerate that.
#[derive(Clone, Default)]
pub struct ServiceLookup {
    services: Arc<BTreeMap<String, Arc<ServiceController>>>,
}

impl ServiceLookup {
    /// Returns the service registered as `name`.
    pub fn get(&self, name: &str) -> Option<ServiceRef> {
        self.services.get(name).map(|c| Arc::clone(c.service()))
    }

    /// Returns the service registered as `name` if it is a `T`.
    ///
    /// For start/shutdown-style services `T` is the registered type, not the adapter.
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let instance = Arc::clone(self.services.get(name)?.instance());
        instance.downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl fmt::Debug for ServiceLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.services.keys()).finish()
    }
}
