//! Event handlers: the subscriber side of the bus.
//!
//! ## Contents
//! - [`Handler`] — trait for implementing async event handlers
//! - [`HandlerFn`] — function-backed handler implementation
//! - [`HandlerRef`] — shared handle (`Arc<dyn Handler>`)
//! - [`HandlerResult`] — what a handler invocation produces

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerRef, HandlerResult};
pub use handler_fn::HandlerFn;
