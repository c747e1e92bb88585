//! Module abstractions: contract, catalog metadata, and loading.
//!
//! ## Contents
//! - [`Module`] - trait for implementing loadable, activatable units
//! - [`ModuleRef`] - shared handle to an instance (`Arc<dyn Module>`)
//! - [`ModuleSpec`] / [`ModuleDescriptor`] - registration input and catalog record
//! - [`ModuleStatus`] - lifecycle state machine
//! - [`Loader`] / [`LoaderFn`] / [`StaticLoader`] - injected construction capability

mod descriptor;
mod loader;
mod module;

pub use descriptor::{ModuleDescriptor, ModuleSpec, ModuleStatus};
pub use loader::{Loader, LoaderFn, ModuleFactory, StaticLoader};
pub use module::{Module, ModuleRef, NoopModule};
