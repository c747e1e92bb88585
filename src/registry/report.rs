//! # Aggregate status reporting.
//!
//! [`StatusReport`] is the registry's one-call diagnostic view, intended for
//! admin surfaces and log dumps. All types serialize to JSON.

use serde::Serialize;
use std::collections::HashMap;

/// A module with a non-zero error count.
#[derive(Clone, Debug, Serialize)]
pub struct FailingModule {
    /// Module id.
    pub id: String,
    /// Consecutive failed load attempts since the last success/reload.
    pub error_count: u32,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Aggregate view over the module catalog.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    /// Registered modules.
    pub total: usize,
    /// Modules currently `Loaded` or `Active`.
    pub loaded: usize,
    /// Id of the active module, if any.
    pub active: Option<String>,
    /// Count per lifecycle status label.
    pub by_status: HashMap<String, usize>,
    /// Average load duration (ms) across modules that have loaded.
    pub avg_load_ms: Option<f64>,
    /// Modules with non-zero error counts, sorted by id.
    pub failing: Vec<FailingModule>,
}
