//! # Configuration for the bus and the registry.
//!
//! Two small config structs, used at construction time:
//! 1. **Bus**: `EventBus::new(BusConfig)`
//! 2. **Registry**: `ModuleRegistry::new(bus, loader, RegistryConfig)`
//!
//! ## Sentinel values
//! - `BusConfig::history_cap = 0` → clamped to 1 (the ring always keeps at
//!   least the most recent event).
//! - `RegistryConfig::load_timeout = 0s` → no deadline (load waits forever).
//! - `RegistryConfig::retry_ceiling = 0` → clamped to 1 (a load always gets
//!   at least one attempt).

use std::time::Duration;

/// Configuration for [`EventBus`](crate::EventBus).
///
/// ## Field semantics
/// - `history_cap`: bounded event history size (oldest evicted first).
/// - `strict_names`: when `true`, subscribing to or publishing an event name
///   outside [`names::STANDARD`](crate::names::STANDARD) logs a
///   warning. Advisory only; the call is never rejected.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Maximum number of history entries retained.
    pub history_cap: usize,

    /// Warn on event names outside the standard registry.
    pub strict_names: bool,
}

impl BusConfig {
    /// Returns the history capacity clamped to a minimum of 1.
    #[inline]
    pub fn history_cap_clamped(&self) -> usize {
        self.history_cap.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    /// - `history_cap = 100`
    /// - `strict_names = false`
    fn default() -> Self {
        Self {
            history_cap: 100,
            strict_names: false,
        }
    }
}

/// Configuration for [`ModuleRegistry`](crate::ModuleRegistry).
///
/// ## Field semantics
/// - `load_timeout`: per-attempt deadline for the injected loader plus the
///   module's `initialize()` hook (`0s` = no deadline).
/// - `retry_ceiling`: maximum consecutive automatic load attempts before the
///   module is left in the `Error` state pending an explicit reload.
/// - `retry_backoff`: fixed delay between consecutive load attempts.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Per-attempt load deadline.
    pub load_timeout: Duration,

    /// Maximum automatic load attempts (min 1, clamped).
    pub retry_ceiling: u32,

    /// Fixed delay between load attempts.
    pub retry_backoff: Duration,
}

impl RegistryConfig {
    /// Returns the load deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → deadline applied per attempt
    #[inline]
    pub fn load_deadline(&self) -> Option<Duration> {
        if self.load_timeout == Duration::ZERO {
            None
        } else {
            Some(self.load_timeout)
        }
    }

    /// Returns the retry ceiling clamped to a minimum of 1.
    #[inline]
    pub fn retry_ceiling_clamped(&self) -> u32 {
        self.retry_ceiling.max(1)
    }
}

impl Default for RegistryConfig {
    /// Default configuration:
    /// - `load_timeout = 10s`
    /// - `retry_ceiling = 3`
    /// - `retry_backoff = 250ms`
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(10),
            retry_ceiling: 3,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_cap_clamped_to_one() {
        let cfg = BusConfig {
            history_cap: 0,
            strict_names: false,
        };
        assert_eq!(cfg.history_cap_clamped(), 1);
    }

    #[test]
    fn test_zero_timeout_means_no_deadline() {
        let cfg = RegistryConfig {
            load_timeout: Duration::ZERO,
            ..RegistryConfig::default()
        };
        assert!(cfg.load_deadline().is_none());
    }

    #[test]
    fn test_retry_ceiling_clamped_to_one() {
        let cfg = RegistryConfig {
            retry_ceiling: 0,
            ..RegistryConfig::default()
        };
        assert_eq!(cfg.retry_ceiling_clamped(), 1);
    }
}
