//! # Example: custom_handler
//!
//! Working with the bus directly: a hand-written [`Handler`] implementation,
//! priority ordering, once-subscriptions, and what happens when a handler
//! fails (isolation + `system:error`).
//!
//! Demonstrates:
//! - Implementing [`Handler`] on your own type (with an owner tag).
//! - Priority ordering within one event's subscribers.
//! - `once` subscriptions and explicit unsubscribe.
//! - Handler failure isolation, [`EventBus::on_error`], and bus stats.
//!
//! ## Run
//! ```bash
//! cargo run --example custom_handler
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use corebus::{
    names, BusConfig, Event, EventBus, Handler, HandlerError, HandlerFn, HandlerRef,
    HandlerResult, SubscribeOptions,
};

/// Collects every payload it sees, tagged with its owner name.
struct Recorder {
    tag: &'static str,
}

#[async_trait]
impl Handler for Recorder {
    async fn handle(&self, event: &Event) -> HandlerResult {
        println!("[{}] #{} {} {}", self.tag, event.seq, event.name, event.payload);
        Ok(Value::Null)
    }

    fn owner(&self) -> Option<&str> {
        Some(self.tag)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corebus=debug".into()),
        )
        .init();

    let bus = EventBus::new(BusConfig::default());

    // 1. Priorities: "first" (10) always runs before "second" (0).
    bus.subscribe_with(
        "data:updated",
        Arc::new(Recorder { tag: "first" }) as HandlerRef,
        SubscribeOptions {
            priority: 10,
            ..Default::default()
        },
    );
    bus.subscribe("data:updated", Arc::new(Recorder { tag: "second" }) as HandlerRef);

    // 2. A once-subscription removes itself after one delivery.
    bus.once(
        "data:updated",
        HandlerFn::arc("one-shot", |ev: Event| async move {
            println!("[one-shot] saw {}", ev.name);
            Ok(Value::Null)
        }),
    );

    // 3. A failing handler: its error is caught, later handlers still run.
    bus.subscribe(
        "data:updated",
        HandlerFn::arc("flaky", |_ev: Event| async move {
            Err::<Value, _>(HandlerError::failed("simulated failure"))
        }),
    );
    bus.on_error(|fault| {
        println!(
            "[on_error] {} handler failed (owner={:?}): {}",
            fault.event,
            fault.owner,
            fault.error.message()
        );
    });

    // 4. publish_sync dispatches inline and returns every handler's result.
    let results = bus
        .publish_sync(Event::new("data:updated", json!({ "rows": 42 })).with_priority(5))
        .await;
    println!(
        "dispatched to {} handlers, {} failed",
        results.len(),
        results.iter().filter(|r| r.is_err()).count()
    );

    // Second publish: the once-handler is gone, the flaky one fails again.
    bus.publish_sync(Event::new("data:updated", json!({ "rows": 43 })))
        .await;

    // 5. The failures were also surfaced as system:error events.
    for entry in bus.history(Some(names::SYSTEM_ERROR)) {
        println!("system:error -> {}", entry.event.payload);
    }

    let stats = bus.stats();
    let data = &stats.events["data:updated"];
    println!(
        "data:updated: emitted={} calls={} errors={} avg={:.2}ms",
        data.emitted, data.handler_calls, data.handler_errors, data.avg_handler_ms
    );
    println!(
        "subscribers={} history_len={}",
        stats.subscriber_count, stats.history_len
    );
    Ok(())
}
