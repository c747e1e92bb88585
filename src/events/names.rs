//! # Canonical event names.
//!
//! String constants for the events the core emits and consumes. Using the
//! constants keeps emitter and subscriber in sync; the bus's strict mode
//! (see [`BusConfig::strict_names`](crate::BusConfig)) warns when a name
//! outside this registry is used. Advisory only: unknown names are always
//! accepted.

/// A module descriptor entered the catalog.
pub const MODULE_REGISTERED: &str = "module:registered";

/// A module finished loading (instance created, `initialize()` done).
pub const MODULE_LOADED: &str = "module:loaded";

/// A module became the active module.
pub const MODULE_ACTIVATED: &str = "module:activated";

/// A module left the active state.
pub const MODULE_DEACTIVATED: &str = "module:deactivated";

/// A module lifecycle operation failed (load attempt or activation hook).
pub const MODULE_ERROR: &str = "module:error";

/// Request to unload and reload a module, resetting its error count.
pub const MODULE_RELOAD: &str = "module:reload";

/// Navigation request: activate the module named in the payload.
pub const NAVIGATION_MODULE: &str = "navigation:module";

/// A navigation-triggered activation failed.
pub const NAVIGATION_ERROR: &str = "navigation:error";

/// Synthetic event published by the bus when a handler fails.
pub const SYSTEM_ERROR: &str = "system:error";

/// Domain event: shared data changed (published by modules, not the core).
pub const DATA_UPDATED: &str = "data:updated";

/// All standard names known to the core.
pub const STANDARD: &[&str] = &[
    MODULE_REGISTERED,
    MODULE_LOADED,
    MODULE_ACTIVATED,
    MODULE_DEACTIVATED,
    MODULE_ERROR,
    MODULE_RELOAD,
    NAVIGATION_MODULE,
    NAVIGATION_ERROR,
    SYSTEM_ERROR,
    DATA_UPDATED,
];

/// Returns true if `name` is one of the standard event names.
pub fn is_standard(name: &str) -> bool {
    STANDARD.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_names_are_recognized() {
        assert!(is_standard(MODULE_LOADED));
        assert!(is_standard(SYSTEM_ERROR));
        assert!(!is_standard("widget:resized"));
    }
}
