//! # Event bus: priority-ordered publish/subscribe.
//!
//! [`EventBus`] decouples producers and consumers of named events inside one
//! process. It supports deferred (queued) and inline dispatch, bounded event
//! history, usage statistics, and per-event error isolation.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                       Subscribers (per event name):
//!   module A ──┐
//!   module B ──┼── publish(Event) ──► [pending queue] ──► drain task
//!   registry ──┘         │                                   │
//!                        │ (history + stats recorded         │ priority-ordered,
//!                        │  at publish time)                 │ handlers awaited
//!                        │                                   ▼ sequentially
//!                        └── publish_sync(Event) ──────► dispatch(&Event)
//!                                (inline, collects results)
//! ```
//!
//! ## Rules
//! - **Deferred emits coalesce**: any number of `publish` calls in one
//!   synchronous turn schedule at most one drain; the drain re-sorts the
//!   batch by priority (ties by `seq`) before the first handler runs, so a
//!   high-priority event published after a low-priority one dispatches first.
//! - **Sequential handlers**: handlers for one event are awaited one at a
//!   time, in descending subscription priority (ties by subscription order).
//! - **Isolation**: a handler error or panic is caught at the invocation
//!   point, counted, reported via a synthetic `system:error` event, and never
//!   stops the remaining handlers or reaches the publisher.
//! - **Error-loop guard**: a failure *while handling* `system:error` is
//!   logged but never re-emitted.
//! - **Snapshot dispatch**: the handler list is snapshotted at dispatch
//!   start, so a handler unsubscribing itself (or others) mid-dispatch is safe.
//! - **Once claims at snapshot**: a `once` subscription is removed from the
//!   table the moment a dispatch snapshots it, never after the handler runs,
//!   so overlapping dispatches cannot fire it twice.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant, SystemTime};

use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::BusConfig;
use crate::error::{BusError, HandlerError};
use crate::events::names;
use crate::events::{Event, HistoryEntry};
use crate::handlers::{HandlerFn, HandlerRef, HandlerResult};

/// Options for [`EventBus::subscribe_with`].
#[derive(Clone, Debug, Default)]
pub struct SubscribeOptions {
    /// Dispatch priority among this event's handlers (higher = sooner).
    pub priority: i32,
    /// Remove the subscription after its first invocation.
    pub once: bool,
    /// Diagnostic tag; overrides [`Handler::owner`](crate::Handler::owner) if set.
    pub owner: Option<String>,
}

/// Capability that removes exactly one subscription.
///
/// Calling [`unsubscribe`](SubscriptionHandle::unsubscribe) twice is a no-op.
/// Dropping the handle does **not** unsubscribe; removal is always explicit.
#[derive(Debug)]
pub struct SubscriptionHandle {
    bus: Weak<BusInner>,
    event: Arc<str>,
    id: u64,
}

impl SubscriptionHandle {
    /// Removes the subscription this handle was returned for. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.bus.upgrade() {
            let mut state = lock(&inner.state);
            if let Some(subs) = state.subs.get_mut(self.event.as_ref()) {
                subs.retain(|s| s.id != self.id);
                if subs.is_empty() {
                    state.subs.remove(self.event.as_ref());
                }
            }
        }
    }

    /// Unique id of the subscription.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Context passed to error listeners registered via [`EventBus::on_error`].
#[derive(Clone, Debug)]
pub struct HandlerFault {
    /// Name of the event whose handler failed.
    pub event: Arc<str>,
    /// Sequence number of the failing event.
    pub event_seq: u64,
    /// Owner tag of the failing subscription, if any.
    pub owner: Option<Arc<str>>,
    /// The caught failure.
    pub error: HandlerError,
}

/// Diagnostic view of one subscription (see [`EventBus::subscribers`]).
#[derive(Clone, Debug)]
pub struct SubscriberInfo {
    /// Unique subscription id.
    pub id: u64,
    /// Event name the subscription belongs to.
    pub event: String,
    /// Owner tag, if any.
    pub owner: Option<String>,
    /// Dispatch priority.
    pub priority: i32,
    /// Whether the subscription self-removes after one invocation.
    pub once: bool,
    /// When the subscription was created.
    pub created_at: SystemTime,
}

/// Per-event-name usage counters (see [`EventBus::stats`]).
#[derive(Clone, Debug, Default, Serialize)]
pub struct EventStats {
    /// Events published under this name (deferred + inline).
    pub emitted: u64,
    /// Handler invocations performed for this name.
    pub handler_calls: u64,
    /// Handler invocations that failed or panicked.
    pub handler_errors: u64,
    /// Rolling average handler processing time, milliseconds.
    pub avg_handler_ms: f64,
}

/// Aggregate bus statistics (see [`EventBus::stats`]).
#[derive(Clone, Debug, Serialize)]
pub struct BusStats {
    /// Counters keyed by event name.
    pub events: HashMap<String, EventStats>,
    /// Events currently queued for the next drain.
    pub queue_depth: usize,
    /// Total live subscriptions across all event names.
    pub subscriber_count: usize,
    /// Current history length (≤ configured cap).
    pub history_len: usize,
}

struct Subscription {
    id: u64,
    handler: HandlerRef,
    priority: i32,
    once: bool,
    owner: Option<Arc<str>>,
    created_at: SystemTime,
}

/// Snapshot of one subscription taken at dispatch start.
struct DispatchSlot {
    id: u64,
    handler: HandlerRef,
    priority: i32,
    owner: Option<Arc<str>>,
}

#[derive(Default)]
struct StatsCell {
    emitted: u64,
    handler_calls: u64,
    handler_errors: u64,
    handler_time: Duration,
}

#[derive(Default)]
struct BusState {
    subs: HashMap<String, Vec<Subscription>>,
    history: VecDeque<HistoryEntry>,
    stats: HashMap<String, StatsCell>,
    queue: Vec<Event>,
    drain_scheduled: bool,
}

struct BusInner {
    cfg: BusConfig,
    state: Mutex<BusState>,
    error_listeners: Mutex<Vec<Box<dyn Fn(&HandlerFault) + Send + Sync>>>,
    next_sub_id: AtomicU64,
}

fn lock(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Priority-ordered publish/subscribe bus.
///
/// Cheap to clone (internally holds an `Arc`); clones share subscriptions,
/// history, stats, and the pending queue.
///
/// Deferred publishing requires a tokio runtime (the drain runs as a spawned
/// task). The bus targets a single logical thread of execution; internal
/// locks are held only for short, await-free critical sections.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates a bus with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                cfg,
                state: Mutex::new(BusState::default()),
                error_listeners: Mutex::new(Vec::new()),
                next_sub_id: AtomicU64::new(0),
            }),
        }
    }

    // ---------------------------
    // Subscription management
    // ---------------------------

    /// Subscribes a handler to `event` with default options.
    pub fn subscribe(&self, event: &str, handler: HandlerRef) -> SubscriptionHandle {
        self.subscribe_with(event, handler, SubscribeOptions::default())
    }

    /// Subscribes a handler with explicit priority / once / owner options.
    ///
    /// Returns a [`SubscriptionHandle`] that removes exactly this
    /// subscription; calling it twice is a no-op.
    pub fn subscribe_with(
        &self,
        event: &str,
        handler: HandlerRef,
        opts: SubscribeOptions,
    ) -> SubscriptionHandle {
        self.advise_name(event, "subscribe");

        let owner: Option<Arc<str>> = opts
            .owner
            .as_deref()
            .or_else(|| handler.owner())
            .map(Arc::from);
        let id = self.inner.next_sub_id.fetch_add(1, AtomicOrdering::Relaxed);
        let sub = Subscription {
            id,
            handler,
            priority: opts.priority,
            once: opts.once,
            owner,
            created_at: SystemTime::now(),
        };

        let mut state = lock(&self.inner.state);
        state.subs.entry(event.to_string()).or_default().push(sub);

        SubscriptionHandle {
            bus: Arc::downgrade(&self.inner),
            event: Arc::from(event),
            id,
        }
    }

    /// Sugar for a subscription that fires at most once, whether that
    /// invocation succeeds or fails.
    ///
    /// The subscription is claimed by the first dispatch that snapshots it,
    /// so it fires exactly once even when dispatches for the same event
    /// overlap at a suspension point.
    pub fn once(&self, event: &str, handler: HandlerRef) -> SubscriptionHandle {
        self.subscribe_with(
            event,
            handler,
            SubscribeOptions {
                once: true,
                ..SubscribeOptions::default()
            },
        )
    }

    /// Removes subscriptions for `event`.
    ///
    /// - `Some(handler)` → removes every subscription of that handler
    ///   (pointer identity).
    /// - `None` → removes all subscriptions for the event name.
    pub fn off(&self, event: &str, handler: Option<&HandlerRef>) {
        let mut state = lock(&self.inner.state);
        match handler {
            None => {
                state.subs.remove(event);
            }
            Some(h) => {
                if let Some(subs) = state.subs.get_mut(event) {
                    subs.retain(|s| !Arc::ptr_eq(&s.handler, h));
                    if subs.is_empty() {
                        state.subs.remove(event);
                    }
                }
            }
        }
    }

    /// Registers an error listener invoked directly (outside the bus's event
    /// flow) whenever a handler fails. Listener panics are caught and logged.
    pub fn on_error<F>(&self, listener: F)
    where
        F: Fn(&HandlerFault) + Send + Sync + 'static,
    {
        let mut listeners = self
            .inner
            .error_listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        listeners.push(Box::new(listener));
    }

    // ---------------------------
    // Publishing
    // ---------------------------

    /// Publishes an event for deferred dispatch.
    ///
    /// Records history and stats immediately, appends the event to the
    /// pending queue, and schedules a drain on the cooperative scheduler.
    /// Draining is coalesced: only one drain is pending at a time, and all
    /// events queued in the same synchronous turn are re-sorted by priority
    /// before the first handler runs.
    pub fn publish(&self, event: Event) {
        self.advise_name(&event.name, "publish");
        self.record(&event);

        let spawn_drain = {
            let mut state = lock(&self.inner.state);
            state.queue.push(event);
            if state.drain_scheduled {
                false
            } else {
                state.drain_scheduled = true;
                true
            }
        };

        if spawn_drain {
            let bus = self.clone();
            tokio::spawn(async move { bus.drain().await });
        }
    }

    /// Publishes an event and dispatches it inline, in the caller's turn.
    ///
    /// Records history and stats like [`publish`](Self::publish), then awaits
    /// every handler in priority order, collecting their results. Handler
    /// failures are isolated exactly as in deferred dispatch; they appear in
    /// the returned vector but never propagate.
    pub async fn publish_sync(&self, event: Event) -> Vec<HandlerResult> {
        self.advise_name(&event.name, "publish");
        self.record(&event);
        self.dispatch(&event).await
    }

    /// Resolves with the payload of the next `event` occurrence, or fails
    /// with [`BusError::WaitTimeout`]. The temporary subscription is removed
    /// in both outcomes.
    pub async fn wait_for(&self, event: &str, timeout: Duration) -> Result<Value, BusError> {
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let handle = self.once(
            event,
            HandlerFn::arc("wait_for", move |ev: Event| {
                let tx = Arc::clone(&tx);
                async move {
                    let sender = tx.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(sender) = sender {
                        let _ = sender.send(ev.payload);
                    }
                    Ok(Value::Null)
                }
            }),
        );

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            // Sender dropped without firing is indistinguishable from timeout
            // for callers; both mean "no matching event observed".
            Ok(Err(_)) | Err(_) => {
                handle.unsubscribe();
                Err(BusError::WaitTimeout {
                    event: event.to_string(),
                    timeout,
                })
            }
        }
    }

    // ---------------------------
    // Observability
    // ---------------------------

    /// Returns recorded history, optionally filtered to one event name.
    /// Oldest first; length never exceeds the configured cap.
    pub fn history(&self, event: Option<&str>) -> Vec<HistoryEntry> {
        let state = lock(&self.inner.state);
        state
            .history
            .iter()
            .filter(|entry| event.map_or(true, |name| entry.event.name.as_ref() == name))
            .cloned()
            .collect()
    }

    /// Clears the recorded history.
    pub fn clear_history(&self) {
        lock(&self.inner.state).history.clear();
    }

    /// Returns a snapshot of usage statistics.
    pub fn stats(&self) -> BusStats {
        let state = lock(&self.inner.state);
        let events = state
            .stats
            .iter()
            .map(|(name, cell)| {
                let avg_handler_ms = if cell.handler_calls == 0 {
                    0.0
                } else {
                    cell.handler_time.as_secs_f64() * 1000.0 / cell.handler_calls as f64
                };
                (
                    name.clone(),
                    EventStats {
                        emitted: cell.emitted,
                        handler_calls: cell.handler_calls,
                        handler_errors: cell.handler_errors,
                        avg_handler_ms,
                    },
                )
            })
            .collect();

        BusStats {
            events,
            queue_depth: state.queue.len(),
            subscriber_count: state.subs.values().map(Vec::len).sum(),
            history_len: state.history.len(),
        }
    }

    /// Resets all usage counters. Counters are otherwise monotone.
    pub fn reset_stats(&self) {
        lock(&self.inner.state).stats.clear();
    }

    /// Returns diagnostic info for live subscriptions, optionally filtered to
    /// one event name.
    pub fn subscribers(&self, event: Option<&str>) -> Vec<SubscriberInfo> {
        let state = lock(&self.inner.state);
        let mut out = Vec::new();
        for (name, subs) in &state.subs {
            if event.map_or(false, |wanted| wanted != name.as_str()) {
                continue;
            }
            for sub in subs {
                out.push(SubscriberInfo {
                    id: sub.id,
                    event: name.clone(),
                    owner: sub.owner.as_deref().map(str::to_string),
                    priority: sub.priority,
                    once: sub.once,
                    created_at: sub.created_at,
                });
            }
        }
        out.sort_by_key(|info| info.id);
        out
    }

    // ---------------------------
    // Internals
    // ---------------------------

    /// Records an event into history (evicting oldest on overflow) and bumps
    /// its emit counter.
    fn record(&self, event: &Event) {
        let cap = self.inner.cfg.history_cap_clamped();
        let mut state = lock(&self.inner.state);
        while state.history.len() >= cap {
            state.history.pop_front();
        }
        state.history.push_back(HistoryEntry {
            event: event.clone(),
            recorded_at: SystemTime::now(),
        });
        state
            .stats
            .entry(event.name.to_string())
            .or_default()
            .emitted += 1;
    }

    /// Drains the pending queue until empty.
    ///
    /// Each pass takes the whole queue under the lock, sorts it by priority
    /// (descending, ties by `seq`), and dispatches sequentially. Events
    /// published by handlers during the drain land in the queue and are
    /// picked up by the next pass; `drain_scheduled` stays set for the whole
    /// drain so no second drain is spawned.
    async fn drain(self) {
        loop {
            let mut batch = {
                let mut state = lock(&self.inner.state);
                if state.queue.is_empty() {
                    state.drain_scheduled = false;
                    return;
                }
                std::mem::take(&mut state.queue)
            };

            batch.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
            for event in &batch {
                self.dispatch(event).await;
            }
        }
    }

    /// Dispatches one event to a snapshot of its subscriptions.
    async fn dispatch(&self, event: &Event) -> Vec<HandlerResult> {
        let slots = self.snapshot_subscriptions(&event.name);
        let mut results = Vec::with_capacity(slots.len());

        for slot in slots {
            let started = Instant::now();
            let caught = std::panic::AssertUnwindSafe(slot.handler.handle(event))
                .catch_unwind()
                .await;
            let elapsed = started.elapsed();

            {
                let mut state = lock(&self.inner.state);
                let cell = state.stats.entry(event.name.to_string()).or_default();
                cell.handler_calls += 1;
                cell.handler_time += elapsed;
            }

            let outcome = match caught {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(err),
                Err(panic) => Err(HandlerError::Panicked {
                    message: panic_message(panic),
                }),
            };

            if let Err(err) = &outcome {
                self.report_handler_failure(event, slot.owner.clone(), err.clone());
            }
            results.push(outcome);
        }

        results
    }

    /// Takes a priority-ordered snapshot of the subscriptions for `event`.
    ///
    /// Dispatch iterates this snapshot, not the live table, so unsubscribing
    /// mid-dispatch is safe. `once` subscriptions are claimed (removed from
    /// the table) here, under the same lock as the snapshot: two dispatches
    /// that overlap at a suspension point can never both observe one.
    fn snapshot_subscriptions(&self, event: &str) -> Vec<DispatchSlot> {
        let mut state = lock(&self.inner.state);
        let Some(subs) = state.subs.get_mut(event) else {
            return Vec::new();
        };
        let mut slots: Vec<DispatchSlot> = subs
            .iter()
            .map(|s| DispatchSlot {
                id: s.id,
                handler: Arc::clone(&s.handler),
                priority: s.priority,
                owner: s.owner.clone(),
            })
            .collect();
        subs.retain(|s| !s.once);
        if subs.is_empty() {
            state.subs.remove(event);
        }
        slots.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
        slots
    }

    /// Counts a handler failure, notifies error listeners, and re-emits it as
    /// a synthetic `system:error` event — unless the failing event *is*
    /// `system:error`, which is only logged (error-loop guard).
    fn report_handler_failure(&self, event: &Event, owner: Option<Arc<str>>, error: HandlerError) {
        {
            let mut state = lock(&self.inner.state);
            state
                .stats
                .entry(event.name.to_string())
                .or_default()
                .handler_errors += 1;
        }

        let fault = HandlerFault {
            event: Arc::clone(&event.name),
            event_seq: event.seq,
            owner,
            error,
        };

        {
            let listeners = self
                .inner
                .error_listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            for listener in listeners.iter() {
                let call = std::panic::AssertUnwindSafe(|| listener(&fault));
                if std::panic::catch_unwind(call).is_err() {
                    warn!(event = %fault.event, "error listener panicked");
                }
            }
        }

        if event.name.as_ref() == names::SYSTEM_ERROR {
            warn!(
                seq = event.seq,
                error = %fault.error,
                "handler failed while handling system:error; not re-emitted"
            );
            return;
        }

        self.publish(
            Event::new(
                names::SYSTEM_ERROR,
                json!({
                    "originalEvent": event.name.as_ref(),
                    "eventSeq": event.seq,
                    "errorMessage": fault.error.message(),
                    "errorKind": fault.error.as_label(),
                    "subscriptionOwner": fault.owner.as_deref(),
                }),
            )
            .with_origin("bus"),
        );
    }

    /// Strict-mode advisory: warn on non-standard names, never reject.
    fn advise_name(&self, event: &str, action: &str) {
        if self.inner.cfg.strict_names && !names::is_standard(event) {
            warn!(event, action, "non-standard event name");
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
