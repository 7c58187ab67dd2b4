//! Service lifecycle registry.
//!
//! An explicit, statically-typed replacement for a runtime DI container:
//! services are registered under a name with a factory closure, a
//! [`Lifetime`] and a list of dependency names. [`ServiceRegistry::start`]
//! computes a startup order once (depth-first topological sort over the
//! singletons), instantiates and initializes them one at a time, and
//! [`ServiceRegistry::stop`] destroys them in exact reverse order.
//!
//! Per-service state machine:
//!
//! ```text
//! (unregistered) -> Registered -> Instantiated -> Initialized -> Destroyed
//! ```
//!
//! Registration hands back a typed [`ServiceKey`], an index into the
//! registry's slot arena, used to resolve the instance later.

mod order;
mod registry;
mod scope;

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

pub use registry::{RegistryStats, Resolver, ServiceRegistry};
pub use scope::ServiceScope;

/// Lifecycle hooks implemented by every registered service.
///
/// All methods have defaults so plain values can be registered with an
/// empty `impl Service for T {}`. The default health check reports healthy,
/// which combined with the registry's "missing instance is unhealthy" rule
/// means "has an instance".
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Called once after instantiation (and after the custom initializer).
    async fn initialize(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    /// Called once during teardown (after the custom disposer).
    async fn destroy(&self) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// How long an instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance, created during [`ServiceRegistry::start`], destroyed on stop.
    Singleton,
    /// One instance per [`ServiceScope`], created lazily.
    Scoped,
    /// A fresh instance on every resolution.
    Transient,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a registered service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Registered,
    Instantiated,
    Initialized,
    Destroyed,
}

/// Errors raised while registering, starting, resolving or stopping services.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Service '{0}' is already registered")]
    DuplicateService(String),

    #[error("Service '{0}' is not registered")]
    UnknownService(String),

    #[error("Service '{service}' depends on unregistered service '{dependency}'")]
    MissingDependency { service: String, dependency: String },

    #[error("Circular dependency detected involving service: {0}")]
    CircularDependency(String),

    #[error("Service '{0}' has not been started")]
    NotStarted(String),

    #[error("Scoped service '{0}' must be resolved through a ServiceScope")]
    ScopeRequired(String),

    #[error("Service '{0}' was resolved with the wrong type")]
    TypeMismatch(String),

    #[error("Failed to initialize service '{service}': {reason}")]
    InitializationFailed { service: String, reason: String },

    /// A failure reported by a service's own hook or factory.
    #[error("{0}")]
    Service(String),

    #[error("Service shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

impl LifecycleError {
    /// Wrap any displayable failure from inside a service hook.
    pub fn service(err: impl std::fmt::Display) -> Self {
        LifecycleError::Service(err.to_string())
    }
}

/// Typed handle to a registered service.
///
/// Cheap to copy; only meaningful for the registry that issued it.
pub struct ServiceKey<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceKey<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceKey<T> {}

impl<T> std::fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceKey").field("index", &self.index).finish()
    }
}

type AnyArc = Arc<dyn Any + Send + Sync>;
type HookFn = Box<dyn Fn(AnyArc) -> BoxFuture<'static, Result<(), LifecycleError>> + Send + Sync>;
type HealthFn = Box<dyn Fn(AnyArc) -> BoxFuture<'static, bool> + Send + Sync>;

/// Optional registration settings: dependencies and custom hooks.
///
/// ```ignore
/// registry.singleton(
///     "database",
///     move |_| DatabaseService::connect_lazy(&url),
///     ServiceOptions::new().depends_on(["config"]),
/// )?;
/// ```
pub struct ServiceOptions<T> {
    dependencies: Vec<String>,
    initializer: Option<HookFn>,
    disposer: Option<HookFn>,
    health_check: Option<HealthFn>,
    _marker: PhantomData<fn(T)>,
}

impl<T: Send + Sync + 'static> ServiceOptions<T> {
    pub fn new() -> Self {
        Self {
            dependencies: Vec::new(),
            initializer: None,
            disposer: None,
            health_check: None,
            _marker: PhantomData,
        }
    }

    /// Names of services that must be started before this one.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Runs after instantiation, before [`Service::initialize`].
    pub fn initializer<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        self.initializer = Some(erase_hook(hook));
        self
    }

    /// Runs during teardown, before [`Service::destroy`].
    pub fn disposer<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        self.disposer = Some(erase_hook(hook));
        self
    }

    /// Replaces [`Service::health_check`] for this registration.
    pub fn health_check<F, Fut>(mut self, probe: F) -> Self
    where
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = bool> + Send + 'static,
    {
        self.health_check = Some(Box::new(move |any: AnyArc| match any.downcast::<T>() {
            Ok(instance) => Box::pin(probe(instance)),
            Err(_) => Box::pin(async { false }),
        }));
        self
    }
}

impl<T: Send + Sync + 'static> Default for ServiceOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn erase_hook<T, F, Fut>(hook: F) -> HookFn
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), LifecycleError>> + Send + 'static,
{
    Box::new(move |any: AnyArc| match any.downcast::<T>() {
        Ok(instance) => Box::pin(hook(instance)),
        Err(_) => Box::pin(async {
            Err(LifecycleError::Service(
                "hook invoked with an instance of the wrong type".into(),
            ))
        }),
    })
}
