//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Event) -> Fut`, producing a fresh
//! future per invocation. The closure receives its own clone of the event, so
//! no shared mutable state is required; if shared state is needed, move an
//! `Arc<...>` into the closure explicitly.
//!
//! ## Example
//! ```rust
//! use serde_json::Value;
//! use corebus::{Event, HandlerFn, HandlerRef, HandlerResult};
//!
//! let h: HandlerRef = HandlerFn::arc("printer", |ev: Event| async move {
//!     println!("{} -> {}", ev.name, ev.payload);
//!     Ok(Value::Null)
//! });
//!
//! assert_eq!(h.owner(), Some("printer"));
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::Event;
use crate::handlers::handler::{Handler, HandlerResult};

/// Function-backed handler implementation.
///
/// Wraps a closure that *creates* a new future per event.
#[derive(Debug)]
pub struct HandlerFn<F> {
    owner: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler with a diagnostic owner tag.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(owner: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            owner: owner.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(owner: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(owner, f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> HandlerResult {
        (self.f)(event.clone()).await
    }

    fn owner(&self) -> Option<&str> {
        Some(&self.owner)
    }
}
