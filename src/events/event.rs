//! # Events carried by the bus.
//!
//! An [`Event`] pairs a name with an arbitrary JSON payload plus dispatch
//! metadata. Events are immutable once enqueued: the bus owns them until
//! dispatch, handlers receive references.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically and doubles as the event id. Within one drain batch, events
//! are dispatched in descending `priority` order, ties broken by `seq`
//! (emission order, stable).
//!
//! ## Example
//! ```rust
//! use corebus::Event;
//! use serde_json::json;
//!
//! let ev = Event::new("data:updated", json!({ "symbol": "AAPL" }))
//!     .with_priority(5)
//!     .with_origin("data-manager");
//!
//! assert_eq!(ev.name.as_ref(), "data:updated");
//! assert_eq!(ev.priority, 5);
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use serde_json::Value;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A named event with payload and dispatch metadata.
///
/// - `seq`: monotonic global sequence, unique per event (also the id)
/// - `at`: wall-clock timestamp (for history and logs)
/// - `priority`: higher dispatches sooner within one drain batch
/// - `origin`: optional best-effort emitter tag for diagnostics
#[derive(Clone, Debug)]
pub struct Event {
    /// Event name (e.g. `module:loaded`, `data:updated`).
    pub name: Arc<str>,
    /// Arbitrary JSON payload.
    pub payload: Value,
    /// Dispatch priority (default 0, higher = sooner).
    pub priority: i32,
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Optional emitter tag for diagnostics.
    pub origin: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event with the current timestamp and next sequence number.
    pub fn new(name: impl Into<Arc<str>>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            priority: 0,
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            origin: None,
        }
    }

    /// Sets the dispatch priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attaches an emitter tag.
    #[inline]
    pub fn with_origin(mut self, origin: impl Into<Arc<str>>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Snapshot of a past event plus the time it was recorded into history.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    /// The recorded event.
    pub event: Event,
    /// When the entry was appended to history.
    pub recorded_at: SystemTime,
}
