//! Error types used by the coordination core.
//!
//! Four error families, matching the isolation boundaries of the system:
//!
//! - [`HandlerError`] — a subscriber failed or panicked. Always recovered by
//!   the bus; reported via the synthetic `system:error` event, never fatal.
//! - [`BusError`] — errors surfaced by bus operations themselves (`wait_for`).
//! - [`ModuleError`] — a module hook or loader failed (module-side message).
//! - [`RegistryError`] — lifecycle operation failures propagated to callers
//!   of the registry (`load`, `activate`, ...).
//!
//! All types provide `as_label()` for stable snake_case labels in logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by event handlers.
///
/// A handler failure is always caught at the point of invocation. It never
/// propagates to the publisher and never prevents later handlers from running.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {message}")]
    Failed {
        /// The underlying error message.
        message: String,
    },

    /// Handler panicked; the panic was caught and converted.
    #[error("handler panicked: {message}")]
    Panicked {
        /// Best-effort panic payload description.
        message: String,
    },
}

impl HandlerError {
    /// Creates a [`HandlerError::Failed`] from any displayable error.
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns the underlying message.
    pub fn message(&self) -> &str {
        match self {
            HandlerError::Failed { message } | HandlerError::Panicked { message } => message,
        }
    }
}

/// # Errors produced by bus operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// `wait_for` did not observe a matching event within the timeout.
    #[error("no '{event}' event within {timeout:?}")]
    WaitTimeout {
        /// Awaited event name.
        event: String,
        /// The configured wait timeout.
        timeout: Duration,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::WaitTimeout { .. } => "bus_wait_timeout",
        }
    }
}

/// # Error raised by module hooks and loaders.
///
/// Carries a plain message: the registry decides retry/propagation policy,
/// the module only reports what went wrong.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ModuleError {
    /// Human-readable failure description.
    pub message: String,
}

impl ModuleError {
    /// Creates a module error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ModuleError {
    fn from(message: &str) -> Self {
        ModuleError::new(message)
    }
}

impl From<String> for ModuleError {
    fn from(message: String) -> Self {
        ModuleError { message }
    }
}

/// # Errors produced by module lifecycle operations.
///
/// Load failures (`LoadTimeout`, `LoadFailed`) are retried by the registry up
/// to the configured ceiling before surfacing as [`RegistryError::RetryExhausted`].
/// Structural failures (`NotRegistered`, `MissingDependency`, `DependencyCycle`)
/// and activation failures are never auto-retried.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Operation referenced an id that was never registered.
    #[error("module '{id}' is not registered")]
    NotRegistered {
        /// The unknown module id.
        id: String,
    },

    /// A declared dependency has no registration in the catalog.
    #[error("module '{id}' depends on unregistered module '{dependency}'")]
    MissingDependency {
        /// The dependent module.
        id: String,
        /// The missing dependency id.
        dependency: String,
    },

    /// Dependency resolution walked back into a module already on the path.
    #[error("dependency cycle detected while loading '{id}': {path:?}")]
    DependencyCycle {
        /// The module that closed the cycle.
        id: String,
        /// Load path at the point of detection.
        path: Vec<String>,
    },

    /// A load attempt exceeded its deadline.
    #[error("loading module '{id}' timed out after {timeout:?}")]
    LoadTimeout {
        /// The module being loaded.
        id: String,
        /// The configured load deadline.
        timeout: Duration,
    },

    /// The loader or initialization hook failed.
    #[error("loading module '{id}' failed: {reason}")]
    LoadFailed {
        /// The module being loaded.
        id: String,
        /// Underlying failure message.
        reason: String,
    },

    /// `error_count` reached the retry ceiling; no further automatic attempts
    /// until an explicit `module:reload` event.
    #[error("module '{id}' exhausted {attempts} load attempts: {reason}")]
    RetryExhausted {
        /// The module left in the error state.
        id: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last failure message.
        reason: String,
    },

    /// An activation or deactivation hook failed. Reported via `module:error`
    /// before being returned to the caller; never auto-retried.
    #[error("activating module '{id}' failed: {reason}")]
    ActivationFailed {
        /// The module whose hook failed.
        id: String,
        /// Hook failure message.
        reason: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use corebus::RegistryError;
    ///
    /// let err = RegistryError::NotRegistered { id: "chart".into() };
    /// assert_eq!(err.as_label(), "module_not_registered");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::NotRegistered { .. } => "module_not_registered",
            RegistryError::MissingDependency { .. } => "module_missing_dependency",
            RegistryError::DependencyCycle { .. } => "module_dependency_cycle",
            RegistryError::LoadTimeout { .. } => "module_load_timeout",
            RegistryError::LoadFailed { .. } => "module_load_failed",
            RegistryError::RetryExhausted { .. } => "module_retry_exhausted",
            RegistryError::ActivationFailed { .. } => "module_activation_failed",
        }
    }

    /// Indicates whether the registry retries this failure automatically.
    ///
    /// Only per-attempt load failures are retryable; structural and
    /// activation errors are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::LoadTimeout { .. } | RegistryError::LoadFailed { .. }
        )
    }
}
