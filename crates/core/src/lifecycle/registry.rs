use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::order::{self, Node};
use super::scope::ServiceScope;
use super::{
    AnyArc, HealthFn, HookFn, LifecycleError, Lifetime, Service, ServiceKey, ServiceOptions,
    ServiceState,
};

type Factory = Arc<dyn Fn(&Resolver<'_>) -> Result<Instance, LifecycleError> + Send + Sync>;

/// A constructed service, viewed both as a concrete value and as a
/// [`Service`] for lifecycle calls.
#[derive(Clone)]
pub(crate) struct Instance {
    any: AnyArc,
    service: Arc<dyn Service>,
}

impl Instance {
    fn from_arc<T: Service>(value: Arc<T>) -> Self {
        Self {
            any: value.clone(),
            service: value,
        }
    }
}

struct ServiceSlot {
    name: String,
    lifetime: Lifetime,
    dependencies: Vec<String>,
    state: ServiceState,
    factory: Factory,
    instance: Option<Instance>,
    initializer: Option<HookFn>,
    disposer: Option<HookFn>,
    health_check: Option<HealthFn>,
}

/// Counts of registered services, by lifetime and by state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total: usize,
    pub singletons: usize,
    pub scoped: usize,
    pub transient: usize,
    pub initialized: usize,
}

/// Owns every registered service and drives their lifecycle.
#[derive(Default)]
pub struct ServiceRegistry {
    slots: Vec<ServiceSlot>,
    by_name: HashMap<String, usize>,
    /// Singletons in the order they were actually instantiated.
    realized: Vec<usize>,
    started: bool,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Fails with [`LifecycleError::DuplicateService`]
    /// if the name is taken.
    pub fn register<T, F>(
        &mut self,
        name: impl Into<String>,
        lifetime: Lifetime,
        factory: F,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError>
    where
        T: Service,
        F: Fn(&Resolver<'_>) -> Result<T, LifecycleError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |resolver: &Resolver<'_>| {
            factory(resolver).map(|value| Instance::from_arc(Arc::new(value)))
        });
        self.insert_slot(name.into(), lifetime, factory, options)
    }

    pub fn singleton<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError>
    where
        T: Service,
        F: Fn(&Resolver<'_>) -> Result<T, LifecycleError> + Send + Sync + 'static,
    {
        self.register(name, Lifetime::Singleton, factory, options)
    }

    pub fn scoped<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError>
    where
        T: Service,
        F: Fn(&Resolver<'_>) -> Result<T, LifecycleError> + Send + Sync + 'static,
    {
        self.register(name, Lifetime::Scoped, factory, options)
    }

    pub fn transient<T, F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError>
    where
        T: Service,
        F: Fn(&Resolver<'_>) -> Result<T, LifecycleError> + Send + Sync + 'static,
    {
        self.register(name, Lifetime::Transient, factory, options)
    }

    /// Register an already-built value as a singleton.
    pub fn value<T: Service>(
        &mut self,
        name: impl Into<String>,
        value: Arc<T>,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError> {
        let factory: Factory =
            Arc::new(move |_: &Resolver<'_>| Ok(Instance::from_arc(value.clone())));
        self.insert_slot(name.into(), Lifetime::Singleton, factory, options)
    }

    fn insert_slot<T>(
        &mut self,
        name: String,
        lifetime: Lifetime,
        factory: Factory,
        options: ServiceOptions<T>,
    ) -> Result<ServiceKey<T>, LifecycleError> {
        if self.by_name.contains_key(&name) {
            return Err(LifecycleError::DuplicateService(name));
        }

        let index = self.slots.len();
        tracing::debug!(service = %name, %lifetime, "Registered service");

        self.by_name.insert(name.clone(), index);
        self.slots.push(ServiceSlot {
            name,
            lifetime,
            dependencies: options.dependencies,
            state: ServiceState::Registered,
            factory,
            instance: None,
            initializer: options.initializer,
            disposer: options.disposer,
            health_check: options.health_check,
        });

        Ok(ServiceKey::new(index))
    }

    /// Instantiate and initialize every singleton in dependency order.
    ///
    /// The order is computed before anything is constructed, so a cycle or
    /// an unknown dependency fails without side effects. If a service fails
    /// to come up, everything instantiated so far (including the failing
    /// service) is torn down in reverse before the error is returned.
    /// Calling `start` on a started registry does nothing.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.started {
            tracing::warn!("Services already started");
            return Ok(());
        }

        let order = {
            let nodes: Vec<Node<'_>> = self
                .slots
                .iter()
                .map(|slot| Node {
                    name: &slot.name,
                    lifetime: slot.lifetime,
                    dependencies: &slot.dependencies,
                })
                .collect();
            order::initialization_order(&nodes)?
        };

        tracing::info!(count = order.len(), "Initializing services");

        for index in order {
            if let Err(e) = self.start_slot(index).await {
                let service = self.slots[index].name.clone();
                tracing::error!(service = %service, error = %e, "Service failed to start");
                self.stop().await;
                return Err(LifecycleError::InitializationFailed {
                    service,
                    reason: e.to_string(),
                });
            }
        }

        self.started = true;
        tracing::info!("All services initialized");
        Ok(())
    }

    async fn start_slot(&mut self, index: usize) -> Result<(), LifecycleError> {
        let factory = Arc::clone(&self.slots[index].factory);
        let instance = factory(&Resolver::new(self, None))?;

        self.slots[index].instance = Some(instance.clone());
        self.slots[index].state = ServiceState::Instantiated;
        self.realized.push(index);

        let initializer = self.slots[index]
            .initializer
            .as_ref()
            .map(|hook| hook(instance.any.clone()));
        if let Some(fut) = initializer {
            fut.await?;
        }
        instance.service.initialize().await?;

        self.slots[index].state = ServiceState::Initialized;
        tracing::debug!(service = %self.slots[index].name, "Service initialized");
        Ok(())
    }

    /// Destroy every realised singleton in reverse instantiation order.
    ///
    /// Disposer and destroy failures are logged and teardown continues.
    pub async fn stop(&mut self) {
        self.started = false;
        if self.realized.is_empty() {
            return;
        }

        tracing::info!("Destroying services");
        let order: Vec<usize> = self.realized.drain(..).rev().collect();
        for index in order {
            self.destroy_slot(index).await;
        }
        tracing::info!("All services destroyed");
    }

    async fn destroy_slot(&mut self, index: usize) {
        let Some(instance) = self.slots[index].instance.take() else {
            return;
        };
        let name = self.slots[index].name.clone();

        let disposer = self.slots[index]
            .disposer
            .as_ref()
            .map(|hook| hook(instance.any.clone()));
        if let Some(fut) = disposer {
            if let Err(e) = fut.await {
                tracing::error!(service = %name, error = %e, "Service disposer failed");
            }
        }
        if let Err(e) = instance.service.destroy().await {
            tracing::error!(service = %name, error = %e, "Failed to destroy service");
        }

        self.slots[index].state = ServiceState::Destroyed;
        tracing::debug!(service = %name, "Service destroyed");
    }

    /// [`stop`](Self::stop), bounded by `timeout`. On expiry the remaining
    /// teardown is abandoned.
    pub async fn shutdown(&mut self, timeout: Duration) -> Result<(), LifecycleError> {
        match tokio::time::timeout(timeout, self.stop()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tracing::error!(?timeout, "Service shutdown timed out");
                Err(LifecycleError::ShutdownTimeout(timeout))
            }
        }
    }

    /// Health of every singleton, keyed by name.
    ///
    /// A singleton without an instance is unhealthy. A custom probe, when
    /// registered, replaces the service's own check.
    pub async fn health_check(&self) -> BTreeMap<String, bool> {
        let mut report = BTreeMap::new();
        for slot in self
            .slots
            .iter()
            .filter(|slot| slot.lifetime == Lifetime::Singleton)
        {
            let healthy = match &slot.instance {
                None => false,
                Some(instance) => match &slot.health_check {
                    Some(probe) => probe(instance.any.clone()).await,
                    None => instance.service.health_check().await,
                },
            };
            report.insert(slot.name.clone(), healthy);
        }
        report
    }

    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.values().all(|healthy| *healthy)
    }

    /// Resolve a singleton or transient service.
    pub fn resolve<T: Send + Sync + 'static>(
        &self,
        key: ServiceKey<T>,
    ) -> Result<Arc<T>, LifecycleError> {
        Resolver::new(self, None).get(key)
    }

    pub fn resolve_by_name<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, LifecycleError> {
        Resolver::new(self, None).get_by_name(name)
    }

    /// Open a scope for resolving [`Lifetime::Scoped`] services.
    pub fn create_scope(&self) -> ServiceScope<'_> {
        ServiceScope::new(self)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn state_of(&self, name: &str) -> Option<ServiceState> {
        self.by_name.get(name).map(|&index| self.slots[index].state)
    }

    /// Registered names, in registration order.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Names of the singletons that have been instantiated, in order.
    pub fn initialization_order(&self) -> Vec<&str> {
        self.realized
            .iter()
            .map(|&index| self.slots[index].name.as_str())
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        self.slots
            .iter()
            .fold(RegistryStats::default(), |mut stats, slot| {
                stats.total += 1;
                match slot.lifetime {
                    Lifetime::Singleton => stats.singletons += 1,
                    Lifetime::Scoped => stats.scoped += 1,
                    Lifetime::Transient => stats.transient += 1,
                }
                if slot.state == ServiceState::Initialized {
                    stats.initialized += 1;
                }
                stats
            })
    }

    fn slot(&self, index: usize) -> Result<&ServiceSlot, LifecycleError> {
        self.slots
            .get(index)
            .ok_or_else(|| LifecycleError::UnknownService(format!("#{index}")))
    }
}

/// Handed to factories so they can pull in their dependencies.
///
/// Tracks the chain of services being constructed so a lazily-resolved
/// cycle among scoped or transient services is reported instead of
/// recursing forever.
pub struct Resolver<'a> {
    registry: &'a ServiceRegistry,
    scope: Option<&'a ServiceScope<'a>>,
    constructing: RefCell<Vec<usize>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a ServiceRegistry, scope: Option<&'a ServiceScope<'a>>) -> Self {
        Self {
            registry,
            scope,
            constructing: RefCell::new(Vec::new()),
        }
    }

    pub fn get<T: Send + Sync + 'static>(
        &self,
        key: ServiceKey<T>,
    ) -> Result<Arc<T>, LifecycleError> {
        self.downcast(key.index)
    }

    pub fn get_by_name<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, LifecycleError> {
        let index = *self
            .registry
            .by_name
            .get(name)
            .ok_or_else(|| LifecycleError::UnknownService(name.to_string()))?;
        self.downcast(index)
    }

    fn downcast<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, LifecycleError> {
        let instance = self.instance(index)?;
        instance
            .any
            .downcast::<T>()
            .map_err(|_| LifecycleError::TypeMismatch(self.registry.slots[index].name.clone()))
    }

    fn instance(&self, index: usize) -> Result<Instance, LifecycleError> {
        let slot = self.registry.slot(index)?;
        match slot.lifetime {
            Lifetime::Singleton => slot
                .instance
                .clone()
                .ok_or_else(|| LifecycleError::NotStarted(slot.name.clone())),
            Lifetime::Transient => self.construct(index, slot),
            Lifetime::Scoped => {
                let scope = self
                    .scope
                    .ok_or_else(|| LifecycleError::ScopeRequired(slot.name.clone()))?;
                if let Some(instance) = scope.cached(index) {
                    return Ok(instance);
                }
                let instance = self.construct(index, slot)?;
                Ok(scope.store(index, instance))
            }
        }
    }

    fn construct(&self, index: usize, slot: &ServiceSlot) -> Result<Instance, LifecycleError> {
        {
            let mut constructing = self.constructing.borrow_mut();
            if constructing.contains(&index) {
                return Err(LifecycleError::CircularDependency(slot.name.clone()));
            }
            constructing.push(index);
        }
        let result = (slot.factory)(self);
        self.constructing.borrow_mut().pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        fail_init: bool,
        fail_destroy: bool,
        healthy: bool,
    }

    impl Probe {
        fn new(name: &'static str, log: Log) -> Self {
            Self {
                name,
                log,
                fail_init: false,
                fail_destroy: false,
                healthy: true,
            }
        }

        fn record(&self, event: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{event}:{}", self.name));
        }
    }

    #[async_trait]
    impl Service for Probe {
        async fn initialize(&self) -> Result<(), LifecycleError> {
            self.record("init");
            if self.fail_init {
                return Err(LifecycleError::service("connection refused"));
            }
            Ok(())
        }

        async fn destroy(&self) -> Result<(), LifecycleError> {
            self.record("destroy");
            if self.fail_destroy {
                return Err(LifecycleError::service("close failed"));
            }
            Ok(())
        }

        async fn health_check(&self) -> bool {
            self.healthy
        }
    }

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn add(
        registry: &mut ServiceRegistry,
        log: &Log,
        name: &'static str,
        deps: &[&str],
        configure: fn(&mut Probe),
    ) -> ServiceKey<Probe> {
        let log = log.clone();
        registry
            .singleton(
                name,
                move |_| {
                    let mut probe = Probe::new(name, log.clone());
                    configure(&mut probe);
                    Ok(probe)
                },
                ServiceOptions::new().depends_on(deps.iter().copied()),
            )
            .unwrap()
    }

    fn plain(_: &mut Probe) {}

    #[tokio::test]
    async fn starts_in_dependency_order_and_stops_in_reverse() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "task_engine", &["database", "event_bus"], plain);
        add(&mut registry, &log, "database", &["config"], plain);
        add(&mut registry, &log, "event_bus", &[], plain);
        add(&mut registry, &log, "config", &[], plain);

        registry.start().await.unwrap();
        assert!(registry.is_started());
        assert_eq!(
            registry.initialization_order(),
            vec!["config", "database", "event_bus", "task_engine"]
        );
        assert_eq!(registry.state_of("database"), Some(ServiceState::Initialized));

        registry.stop().await;
        assert_eq!(
            entries(&log),
            vec![
                "init:config",
                "init:database",
                "init:event_bus",
                "init:task_engine",
                "destroy:task_engine",
                "destroy:event_bus",
                "destroy:database",
                "destroy:config",
            ]
        );
        assert_eq!(registry.state_of("config"), Some(ServiceState::Destroyed));
    }

    #[tokio::test]
    async fn cycle_fails_before_anything_is_instantiated() {
        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = ServiceRegistry::new();
        for (name, dep) in [("a", "b"), ("b", "a")] {
            let built = built.clone();
            let log = new_log();
            registry
                .singleton(
                    name,
                    move |_| {
                        built.fetch_add(1, Ordering::SeqCst);
                        Ok(Probe::new("x", log.clone()))
                    },
                    ServiceOptions::new().depends_on([dep]),
                )
                .unwrap();
        }

        assert_matches!(
            registry.start().await,
            Err(LifecycleError::CircularDependency(_))
        );
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert!(!registry.is_started());
    }

    #[tokio::test]
    async fn unknown_dependency_fails_startup() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "database", &["config"], plain);

        assert_matches!(
            registry.start().await,
            Err(LifecycleError::MissingDependency { service, dependency })
                if service == "database" && dependency == "config"
        );
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn failed_initialization_tears_down_what_was_started() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        add(&mut registry, &log, "database", &["config"], |p| p.fail_init = true);
        add(&mut registry, &log, "task_engine", &["database"], plain);

        assert_matches!(
            registry.start().await,
            Err(LifecycleError::InitializationFailed { service, .. }) if service == "database"
        );
        assert_eq!(
            entries(&log),
            vec![
                "init:config",
                "init:database",
                "destroy:database",
                "destroy:config"
            ]
        );
        assert_eq!(registry.state_of("task_engine"), Some(ServiceState::Registered));
        assert!(!registry.is_started());
    }

    #[tokio::test]
    async fn teardown_continues_past_a_failing_destroy() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "a", &[], plain);
        add(&mut registry, &log, "b", &["a"], |p| p.fail_destroy = true);
        add(&mut registry, &log, "c", &["b"], plain);

        registry.start().await.unwrap();
        registry.stop().await;

        let destroyed: Vec<String> = entries(&log)
            .into_iter()
            .filter(|e| e.starts_with("destroy"))
            .collect();
        assert_eq!(destroyed, vec!["destroy:c", "destroy:b", "destroy:a"]);
        assert_eq!(registry.state_of("a"), Some(ServiceState::Destroyed));
    }

    #[tokio::test]
    async fn custom_hooks_wrap_the_service_hooks() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        let (setup_log, dispose_log, probe_log) = (log.clone(), log.clone(), log.clone());
        registry
            .singleton(
                "database",
                move |_| Ok(Probe::new("database", probe_log.clone())),
                ServiceOptions::new()
                    .initializer(move |_: Arc<Probe>| {
                        let log = setup_log.clone();
                        async move {
                            log.lock().unwrap().push("setup:database".into());
                            Ok(())
                        }
                    })
                    .disposer(move |_: Arc<Probe>| {
                        let log = dispose_log.clone();
                        async move {
                            log.lock().unwrap().push("dispose:database".into());
                            Ok(())
                        }
                    }),
            )
            .unwrap();

        registry.start().await.unwrap();
        registry.stop().await;

        assert_eq!(
            entries(&log),
            vec![
                "setup:database",
                "init:database",
                "dispose:database",
                "destroy:database"
            ]
        );
    }

    #[tokio::test]
    async fn health_report_covers_every_singleton() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        add(&mut registry, &log, "database", &[], |p| p.healthy = false);
        let probe_log = log.clone();
        registry
            .singleton(
                "realtime",
                move |_| Ok(Probe::new("realtime", probe_log.clone())),
                ServiceOptions::new().health_check(|_: Arc<Probe>| async { false }),
            )
            .unwrap();

        let before = registry.health_check().await;
        assert!(before.values().all(|healthy| !healthy));

        registry.start().await.unwrap();
        let report = registry.health_check().await;
        assert_eq!(report.get("config"), Some(&true));
        assert_eq!(report.get("database"), Some(&false));
        assert_eq!(report.get("realtime"), Some(&false));
        assert!(!registry.is_healthy().await);

        registry.stop().await;
        assert_eq!(registry.health_check().await.get("config"), Some(&false));
    }

    #[tokio::test]
    async fn all_healthy_means_healthy() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        registry.start().await.unwrap();
        assert!(registry.is_healthy().await);
    }

    struct Slow;

    #[async_trait]
    impl Service for Slow {
        async fn destroy(&self) -> Result<(), LifecycleError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_gives_up_after_the_timeout() {
        let mut registry = ServiceRegistry::new();
        registry
            .singleton("slow", |_| Ok(Slow), ServiceOptions::new())
            .unwrap();
        registry.start().await.unwrap();

        let timeout = Duration::from_millis(20);
        assert_matches!(
            registry.shutdown(timeout).await,
            Err(LifecycleError::ShutdownTimeout(t)) if t == timeout
        );
    }

    #[tokio::test]
    async fn shutdown_within_the_timeout_succeeds() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        registry.start().await.unwrap();
        registry.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(entries(&log), vec!["init:config", "destroy:config"]);
    }

    #[tokio::test]
    async fn factories_resolve_their_dependencies() {
        #[derive(Debug)]
        struct Config {
            url: String,
        }
        impl Service for Config {}
        #[derive(Debug)]
        struct Database {
            url: String,
        }
        impl Service for Database {}

        let mut registry = ServiceRegistry::new();
        let config = registry
            .value(
                "config",
                Arc::new(Config {
                    url: "postgres://localhost/board".into(),
                }),
                ServiceOptions::new(),
            )
            .unwrap();
        let database = registry
            .singleton(
                "database",
                move |r| {
                    let config = r.get(config)?;
                    Ok(Database {
                        url: config.url.clone(),
                    })
                },
                ServiceOptions::new().depends_on(["config"]),
            )
            .unwrap();

        assert_matches!(registry.resolve(database), Err(LifecycleError::NotStarted(_)));

        registry.start().await.unwrap();
        let first = registry.resolve(database).unwrap();
        let second = registry.resolve_by_name::<Database>("database").unwrap();
        assert_eq!(first.url, "postgres://localhost/board");
        assert!(Arc::ptr_eq(&first, &second));
        assert_matches!(
            registry.resolve_by_name::<Config>("database"),
            Err(LifecycleError::TypeMismatch(_))
        );
    }

    #[tokio::test]
    async fn transient_and_scoped_lifetimes() {
        #[derive(Debug)]
        struct Counter(usize);
        impl Service for Counter {}

        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = ServiceRegistry::new();
        let b = built.clone();
        let transient = registry
            .transient(
                "transient",
                move |_| Ok(Counter(b.fetch_add(1, Ordering::SeqCst))),
                ServiceOptions::new(),
            )
            .unwrap();
        let b = built.clone();
        let scoped = registry
            .scoped(
                "scoped",
                move |_| Ok(Counter(b.fetch_add(1, Ordering::SeqCst))),
                ServiceOptions::new(),
            )
            .unwrap();

        registry.start().await.unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 0, "start builds singletons only");

        let t1 = registry.resolve(transient).unwrap();
        let t2 = registry.resolve(transient).unwrap();
        assert!(!Arc::ptr_eq(&t1, &t2));

        assert_matches!(registry.resolve(scoped), Err(LifecycleError::ScopeRequired(_)));

        let scope_a = registry.create_scope();
        let a1 = scope_a.resolve(scoped).unwrap();
        let a2 = scope_a.resolve(scoped).unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(scope_a.len(), 1);

        let scope_b = registry.create_scope();
        let b1 = scope_b.resolve(scoped).unwrap();
        assert!(!Arc::ptr_eq(&a1, &b1));
        assert_ne!(a1.0, b1.0);

        assert!(registry.health_check().await.is_empty());
    }

    #[tokio::test]
    async fn lazy_cycle_among_transients_is_reported() {
        #[derive(Debug)]
        struct Node;
        impl Service for Node {}

        let mut registry = ServiceRegistry::new();
        registry
            .transient(
                "left",
                |r| {
                    r.get_by_name::<Node>("right")?;
                    Ok(Node)
                },
                ServiceOptions::new(),
            )
            .unwrap();
        let right = registry
            .transient(
                "right",
                |r| {
                    r.get_by_name::<Node>("left")?;
                    Ok(Node)
                },
                ServiceOptions::new(),
            )
            .unwrap();

        assert_matches!(
            registry.resolve(right),
            Err(LifecycleError::CircularDependency(name)) if name == "right"
        );
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        let log2 = log.clone();
        assert_matches!(
            registry.singleton(
                "config",
                move |_| Ok(Probe::new("config", log2.clone())),
                ServiceOptions::new()
            ),
            Err(LifecycleError::DuplicateService(name)) if name == "config"
        );
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let log = new_log();
        let mut registry = ServiceRegistry::new();
        add(&mut registry, &log, "config", &[], plain);
        registry.start().await.unwrap();
        registry.start().await.unwrap();
        assert_eq!(entries(&log), vec!["init:config"]);
    }

    #[tokio::test]
    async fn stats_count_by_lifetime_and_state() {
        struct Unit;
        impl Service for Unit {}

        let mut registry = ServiceRegistry::new();
        registry.singleton("a", |_| Ok(Unit), ServiceOptions::new()).unwrap();
        registry.singleton("b", |_| Ok(Unit), ServiceOptions::new()).unwrap();
        registry.scoped("c", |_| Ok(Unit), ServiceOptions::new()).unwrap();
        registry.transient("d", |_| Ok(Unit), ServiceOptions::new()).unwrap();

        assert_eq!(registry.stats().initialized, 0);
        registry.start().await.unwrap();
        assert_eq!(
            registry.stats(),
            RegistryStats {
                total: 4,
                singletons: 2,
                scoped: 1,
                transient: 1,
                initialized: 2,
            }
        );
        assert!(registry.contains("c"));
        assert_eq!(
            registry.service_names().collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
    }
}
