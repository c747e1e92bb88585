//! # Loader: injected module-construction capability.
//!
//! The registry never constructs module instances itself; it asks an injected
//! [`Loader`] to resolve an opaque locator into a [`ModuleRef`]. This keeps
//! the registry testable with a fake loader and portable across loading
//! mechanisms (dynamic library load, reflection, or a compile-time registry
//! keyed by locator — see [`StaticLoader`]).
//!
//! The registry applies its own deadline around `load`; a loader does not
//! need to time itself out.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::ModuleError;
use crate::modules::module::ModuleRef;

/// Resolves an opaque locator into a module instance.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// Loads and constructs the module identified by `locator`.
    async fn load(&self, locator: &str) -> Result<ModuleRef, ModuleError>;
}

/// Function-backed loader, for tests and small applications.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use corebus::{LoaderFn, ModuleError, ModuleRef, NoopModule};
///
/// let loader = LoaderFn::arc(|locator: String| async move {
///     match locator.as_str() {
///         "widgets/noop" => Ok::<ModuleRef, ModuleError>(Arc::new(NoopModule) as ModuleRef),
///         other => Err(format!("unknown locator '{other}'").into()),
///     }
/// });
/// ```
pub struct LoaderFn<F> {
    f: F,
}

impl<F> LoaderFn<F> {
    /// Creates a new function-backed loader.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the loader and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ModuleRef, ModuleError>> + Send + 'static,
{
    async fn load(&self, locator: &str) -> Result<ModuleRef, ModuleError> {
        (self.f)(locator.to_string()).await
    }
}

/// Factory producing a fresh module instance per load.
pub type ModuleFactory = Arc<dyn Fn() -> ModuleRef + Send + Sync>;

/// Compile-time module registry keyed by locator.
///
/// The portable stand-in for runtime dynamic import: applications register a
/// factory per locator at startup, and each `load` call invokes the factory
/// to produce a fresh instance.
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use corebus::{StaticLoader, ModuleRef, NoopModule};
///
/// let loader = StaticLoader::new()
///     .with("widgets/chart", || Arc::new(NoopModule) as ModuleRef);
/// ```
#[derive(Default)]
pub struct StaticLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl StaticLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `locator` (builder form).
    pub fn with<F>(mut self, locator: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> ModuleRef + Send + Sync + 'static,
    {
        self.factories.insert(locator.into(), Arc::new(factory));
        self
    }

    /// Registers a factory for `locator`.
    pub fn insert<F>(&mut self, locator: impl Into<String>, factory: F)
    where
        F: Fn() -> ModuleRef + Send + Sync + 'static,
    {
        self.factories.insert(locator.into(), Arc::new(factory));
    }
}

#[async_trait]
impl Loader for StaticLoader {
    async fn load(&self, locator: &str) -> Result<ModuleRef, ModuleError> {
        match self.factories.get(locator) {
            Some(factory) => Ok(factory()),
            None => Err(ModuleError::new(format!(
                "no factory registered for locator '{locator}'"
            ))),
        }
    }
}
