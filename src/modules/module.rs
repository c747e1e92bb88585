//! # Module contract: the polymorphic capability set of a loadable unit.
//!
//! Any registrable unit implements [`Module`]. All four lifecycle hooks are
//! optional in the sense that the default implementation is a successful
//! no-op; a module overrides only what it needs.
//!
//! ## Hook call order
//! ```text
//! load:       Loader::load() → initialize()          (status: Loading → Loaded)
//! activate:   [deactivate previous] → activate()     (status: Loaded → Active)
//! deactivate: deactivate()                           (status: Active → Loaded)
//! unload:     [deactivate if active] → cleanup()     (status: → Registered)
//! ```
//!
//! Hooks are awaited by the registry; a hook error during load is retried
//! under the registry's retry policy, a hook error during activation is
//! reported and rethrown to the caller.
//!
//! ## Example
//! ```
//! use async_trait::async_trait;
//! use corebus::{Module, ModuleError};
//!
//! struct ChartWidget;
//!
//! #[async_trait]
//! impl Module for ChartWidget {
//!     async fn initialize(&self) -> Result<(), ModuleError> {
//!         // allocate canvases, warm caches...
//!         Ok(())
//!     }
//!
//!     async fn activate(&self) -> Result<(), ModuleError> {
//!         // attach to the visible surface
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::ModuleError;

/// Shared handle to a module instance (`Arc<dyn Module>`).
///
/// The registry is the exclusive owner of the instance for lifecycle
/// purposes; handles returned from `load` are observers.
pub type ModuleRef = Arc<dyn Module>;

/// # A loadable, activatable unit.
///
/// Every hook defaults to a successful no-op; absence of behavior is valid.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Called once after the loader produced the instance, before the module
    /// is considered loaded.
    async fn initialize(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Called when the module becomes the active module.
    async fn activate(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Called when the module stops being the active module.
    async fn deactivate(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Called on unload, before the registry releases the instance.
    async fn cleanup(&self) -> Result<(), ModuleError> {
        Ok(())
    }
}

// Instances are opaque to the registry, but `ModuleRef` results must be
// debuggable (assertions, error formatting).
impl fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Module")
    }
}

/// A module with no behavior at all; useful as a dependency placeholder and
/// in tests.
pub struct NoopModule;

#[async_trait]
impl Module for NoopModule {}
