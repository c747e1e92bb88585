//! # Core handler trait.
//!
//! `Handler` is the extension point for reacting to bus events. Handlers are
//! invoked sequentially, in subscription-priority order, by the bus's dispatch
//! routine; no two handlers for the same event run concurrently on behalf of
//! one emit.
//!
//! ## Contract
//! - A handler may be slow (I/O, batching); it delays later handlers for the
//!   same event but never the publisher of a deferred emit.
//! - Errors and panics are caught by the bus, counted, and reported via the
//!   synthetic `system:error` event. They never reach the publisher.
//! - The optional [`owner`](Handler::owner) tag identifies the subscriber in
//!   diagnostics (`system:error` payloads, `subscribers()` listings).

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::events::Event;

/// What one handler invocation produces.
///
/// Synchronous dispatch (`publish_sync`) collects these per handler; the
/// value is whatever the handler chooses to return (often `Value::Null`).
pub type HandlerResult = Result<Value, HandlerError>;

/// Shared handle to a handler (`Arc<dyn Handler>`).
pub type HandlerRef = Arc<dyn Handler>;

/// # Asynchronous event handler.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use corebus::{Event, Handler, HandlerResult};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Handler for Audit {
///     async fn handle(&self, event: &Event) -> HandlerResult {
///         // write audit record...
///         let _ = event;
///         Ok(Value::Null)
///     }
///
///     fn owner(&self) -> Option<&str> {
///         Some("audit")
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handles a single event.
    ///
    /// The event is borrowed; the bus retains ownership until dispatch of the
    /// whole batch completes.
    async fn handle(&self, event: &Event) -> HandlerResult;

    /// Optional diagnostic tag identifying the subscriber.
    fn owner(&self) -> Option<&str> {
        None
    }
}
