//! # corebus
//!
//! **Corebus** is an in-process coordination core for modular applications:
//! a priority-aware event bus plus a module registry that loads, activates,
//! and supervises the modules communicating over that bus.
//!
//! It provides the decoupling layer for plugin-style applications: modules
//! never call each other directly, they publish and subscribe on the bus,
//! and the registry drives their lifecycle in response to navigation and
//! reload events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!  │  ModuleSpec  │   │  ModuleSpec  │   │  ModuleSpec  │
//!  │ (chart)      │   │ (dashboard)  │   │ (settings)   │
//!  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!         ▼                  ▼                  ▼
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ModuleRegistry (catalog + lifecycle)                          │
//! │  - depth-first dependency loading (cycle detection)            │
//! │  - deadline per load attempt, retry with a ceiling             │
//! │  - in-flight loads collapse per module id (watch channel)      │
//! │  - single-active activation (navigation semantics)             │
//! └──────┬─────────────────────────────────────────────────▲───────┘
//!        │ publishes                                        │ consumes
//!        │  module:registered / module:loaded               │  navigation:module
//!        │  module:activated / module:deactivated           │  module:reload
//!        │  module:error / navigation:error                 │
//!        ▼                                                  │
//! ┌────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                      │
//! │  - per-event subscriber lists, priority-ordered dispatch       │
//! │  - deferred publish (coalesced drain task) or publish_sync     │
//! │  - per-handler panic/error isolation ──► system:error          │
//! │  - bounded history, per-event stats, wait_for                  │
//! └──────┬─────────────────┬─────────────────┬─────────────────────┘
//!        ▼                 ▼                 ▼
//!    handler (p=10)    handler (p=0)     handler (once)
//! ```
//!
//! ### Module lifecycle
//! ```text
//! register(spec) ──► Registered
//!
//! load(id):
//!   ├─► dependencies first (depth-first, cycle detection)
//!   └─► loop {
//!         ├─► Loader::load(locator) raced against the deadline
//!         ├─► Ok  ──► initialize() ──► Loaded, module:loaded
//!         └─► Err ──► error_count += 1, module:error
//!               ├─ under ceiling ──► sleep(backoff), retry
//!               └─ at ceiling    ──► Error (sticky until module:reload)
//!       }
//!
//! activate(id) ──► load(id) ──► deactivate previous ──► Active
//! unload(id)   ──► deactivate if active ──► cleanup() ──► Registered
//! ```
//!
//! ## Features
//! | Area            | Description                                                      | Key types / traits                        |
//! |-----------------|------------------------------------------------------------------|-------------------------------------------|
//! | **Bus**         | Publish/subscribe with priorities, once-handlers, history, stats.| [`EventBus`], [`Event`], [`SubscribeOptions`] |
//! | **Handlers**    | Async subscribers as trait objects or plain closures.            | [`Handler`], [`HandlerFn`], [`HandlerRef`]|
//! | **Modules**     | Loadable units with lifecycle hooks.                             | [`Module`], [`ModuleSpec`], [`ModuleStatus`] |
//! | **Loading**     | Injected construction capability, static registry included.      | [`Loader`], [`LoaderFn`], [`StaticLoader`]|
//! | **Registry**    | Catalog, dependency resolution, activation, reporting.           | [`ModuleRegistry`], [`StatusReport`]      |
//! | **Errors**      | Typed errors per isolation boundary.                             | [`HandlerError`], [`RegistryError`]       |
//! | **Configuration** | History bound, load deadline, retry ceiling and backoff.       | [`BusConfig`], [`RegistryConfig`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use corebus::{
//!     names, BusConfig, Event, EventBus, ModuleRef, ModuleRegistry, ModuleSpec,
//!     NoopModule, RegistryConfig, StaticLoader,
//! };
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!
//!     // Loaders resolve opaque locators into module instances.
//!     let loader = Arc::new(
//!         StaticLoader::new()
//!             .with("widgets/chart", || Arc::new(NoopModule) as ModuleRef)
//!             .with("widgets/dashboard", || Arc::new(NoopModule) as ModuleRef),
//!     );
//!
//!     let registry = ModuleRegistry::new(bus.clone(), loader, RegistryConfig::default());
//!     registry.attach();
//!
//!     registry.register(ModuleSpec::new("chart", "Chart", "widgets/chart"));
//!     registry.register(
//!         ModuleSpec::new("dashboard", "Dashboard", "widgets/dashboard")
//!             .with_dependencies(["chart"]),
//!     );
//!
//!     // Navigate by event; the registry loads dependencies and activates.
//!     bus.publish_sync(Event::new(
//!         names::NAVIGATION_MODULE,
//!         json!({ "moduleId": "dashboard" }),
//!     ))
//!     .await;
//!
//!     assert_eq!(registry.active(), Some("dashboard".into()));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod handlers;
mod modules;
mod registry;

// ---- Public re-exports ----

pub use config::{BusConfig, RegistryConfig};
pub use error::{BusError, HandlerError, ModuleError, RegistryError};
pub use events::{
    names, BusStats, Event, EventBus, EventStats, HandlerFault, HistoryEntry, SubscribeOptions,
    SubscriberInfo, SubscriptionHandle,
};
pub use handlers::{Handler, HandlerFn, HandlerRef, HandlerResult};
pub use modules::{
    Loader, LoaderFn, Module, ModuleDescriptor, ModuleFactory, ModuleRef, ModuleSpec,
    ModuleStatus, NoopModule, StaticLoader,
};
pub use registry::{FailingModule, ModuleRegistry, StatusReport};
