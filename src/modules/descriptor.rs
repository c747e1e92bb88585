//! # Module descriptors: catalog metadata and lifecycle status.
//!
//! A [`ModuleSpec`] is what callers hand to `register`; a
//! [`ModuleDescriptor`] is the registry's catalog record derived from it,
//! carrying the mutable lifecycle state (`status`, `error_count`,
//! `load_duration`, `last_error`).
//!
//! ## Lifecycle state machine
//! ```text
//! Registered ──► Loading ──► Loaded ──► Active
//!                  │  ▲        ▲  │        │
//!                  ▼  │        │  └────────┘ (deactivate)
//!                Error ┘ (retry, automatic under the ceiling
//!                         or on explicit module:reload)
//! Loaded/Active ──► Registered (unload)
//! ```

use serde::Serialize;
use std::time::{Duration, SystemTime};

/// Lifecycle status of a registered module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// In the catalog, no instance.
    Registered,
    /// A load attempt is in flight.
    Loading,
    /// Instance created and initialized.
    Loaded,
    /// The single current module.
    Active,
    /// Last load attempt failed; permanent once the retry ceiling is reached.
    Error,
}

impl ModuleStatus {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ModuleStatus::Registered => "registered",
            ModuleStatus::Loading => "loading",
            ModuleStatus::Loaded => "loaded",
            ModuleStatus::Active => "active",
            ModuleStatus::Error => "error",
        }
    }

    /// True for `Loaded` and `Active` (instance exists and is initialized).
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModuleStatus::Loaded | ModuleStatus::Active)
    }
}

/// Registration input: identity, locator, and dependency declaration.
///
/// ## Example
/// ```
/// use corebus::ModuleSpec;
///
/// let spec = ModuleSpec::new("dashboard", "Dashboard", "widgets/dashboard")
///     .with_category("analytics")
///     .with_dependencies(["chart"])
///     .with_priority(10);
/// assert_eq!(spec.dependencies, vec!["chart"]);
/// ```
#[derive(Clone, Debug)]
pub struct ModuleSpec {
    /// Unique module id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Grouping category (free-form).
    pub category: String,
    /// Opaque locator handed to the injected `Loader`.
    pub locator: String,
    /// Ids of modules that must be loaded first.
    pub dependencies: Vec<String>,
    /// Descriptor priority (free-form ordering hint for consumers).
    pub priority: i32,
}

impl ModuleSpec {
    /// Creates a spec with empty category, no dependencies, priority 0.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        locator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            locator: locator.into(),
            dependencies: Vec::new(),
            priority: 0,
        }
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the dependency list.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the priority hint.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Catalog record for one registered module.
///
/// Cloned out of the registry by [`descriptor`](crate::ModuleRegistry::descriptor);
/// the registry's copy is the authoritative one.
#[derive(Clone, Debug)]
pub struct ModuleDescriptor {
    /// Unique module id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Grouping category.
    pub category: String,
    /// Opaque locator handed to the loader.
    pub locator: String,
    /// Ids of modules that must be loaded first.
    pub dependencies: Vec<String>,
    /// Descriptor priority hint.
    pub priority: i32,
    /// Current lifecycle status.
    pub status: ModuleStatus,
    /// Duration of the successful load attempt, if any.
    pub load_duration: Option<Duration>,
    /// Consecutive failed load attempts since the last success/reload.
    pub error_count: u32,
    /// Message of the most recent failure, if any.
    pub last_error: Option<String>,
    /// When the descriptor entered the catalog.
    pub registered_at: SystemTime,
}

impl ModuleDescriptor {
    /// Creates a fresh descriptor (status `Registered`) from a spec.
    pub fn from_spec(spec: ModuleSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            category: spec.category,
            locator: spec.locator,
            dependencies: spec.dependencies,
            priority: spec.priority,
            status: ModuleStatus::Registered,
            load_duration: None,
            error_count: 0,
            last_error: None,
            registered_at: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_starts_registered() {
        let d = ModuleDescriptor::from_spec(ModuleSpec::new("a", "A", "mods/a"));
        assert_eq!(d.status, ModuleStatus::Registered);
        assert_eq!(d.error_count, 0);
        assert!(d.load_duration.is_none());
    }

    #[test]
    fn test_status_is_loaded_covers_active() {
        assert!(ModuleStatus::Loaded.is_loaded());
        assert!(ModuleStatus::Active.is_loaded());
        assert!(!ModuleStatus::Loading.is_loaded());
        assert!(!ModuleStatus::Error.is_loaded());
    }
}
