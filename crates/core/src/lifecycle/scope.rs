use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::registry::{Instance, Resolver, ServiceRegistry};
use super::{LifecycleError, ServiceKey};

/// A resolution scope: each [`Lifetime::Scoped`](super::Lifetime::Scoped)
/// service is built at most once per scope, on first use.
///
/// Scoped instances are dropped with the scope; they never take part in
/// the registry's initialize/destroy sequence.
pub struct ServiceScope<'r> {
    registry: &'r ServiceRegistry,
    instances: Mutex<HashMap<usize, Instance>>,
}

impl<'r> ServiceScope<'r> {
    pub(crate) fn new(registry: &'r ServiceRegistry) -> Self {
        Self {
            registry,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve any service; scoped ones are cached in this scope.
    pub fn resolve<T: Send + Sync + 'static>(
        &self,
        key: ServiceKey<T>,
    ) -> Result<Arc<T>, LifecycleError> {
        Resolver::new(self.registry, Some(self)).get(key)
    }

    /// Number of scoped instances built so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn cached(&self, index: usize) -> Option<Instance> {
        self.lock().get(&index).cloned()
    }

    /// Cache `instance` unless another resolution got there first; returns
    /// whichever instance the scope now holds.
    pub(crate) fn store(&self, index: usize, instance: Instance) -> Instance {
        self.lock().entry(index).or_insert(instance).clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<usize, Instance>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
