//! # Module registry: event-driven module lifecycle manager.
//!
//! [`ModuleRegistry`] owns the catalog of loadable modules and enforces a
//! safe load → activate → deactivate → unload lifecycle with dependency
//! ordering, bounded-time loading, and retry with a ceiling.
//!
//! ## Architecture
//! ```text
//! register(spec) ──► catalog (ModuleDescriptor per id)
//!
//! load(id):
//!   ├─► collapse: join an in-flight load for the same id (watch channel)
//!   ├─► depth-first dependency loading (cycle + missing-dep detection, fatal)
//!   └─► attempt loop:
//!         ├─► attempt_seq += 1
//!         ├─► race Loader::load(locator) against the configured deadline
//!         │     └─ late completions are discarded by attempt sequence
//!         ├─► Ok  ──► initialize() ──► Loaded, emit module:loaded
//!         └─► Err ──► error_count += 1, emit module:error
//!               ├─ under ceiling ──► sleep(backoff), retry
//!               └─ at ceiling    ──► Error until module:reload, return RetryExhausted
//!
//! activate(id):
//!   ├─► load(id) (idempotent)
//!   ├─► deactivate the previously active module (hook awaited)
//!   └─► activate() hook ──► Active, emit module:activated
//!                     └─ Err ──► emit module:error, return ActivationFailed
//! ```
//!
//! ## Bus integration
//! After [`attach`](ModuleRegistry::attach), the registry consumes:
//! - `navigation:module {moduleId}` → `activate`, failures re-emitted as
//!   `navigation:error`;
//! - `module:reload {moduleId}` → reset error count, unload → load →
//!   re-activate if it was the active module.
//!
//! ## Rules
//! - At most one module is `Active` at any time.
//! - A module reaches `Loaded` only after every dependency is `Loaded`.
//! - Concurrent `load` calls for one id share the same eventual outcome;
//!   only one loader invocation is in flight per id.
//! - A loading caller that is cancelled (its future dropped) releases the
//!   in-flight slot; waiters and later callers take over the load.
//! - The deadline never aborts in-flight loader work; it only stops the
//!   registry from waiting and fails the attempt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{HandlerError, ModuleError, RegistryError};
use crate::events::{names, Event, EventBus, SubscribeOptions};
use crate::handlers::HandlerFn;
use crate::modules::{Loader, ModuleDescriptor, ModuleRef, ModuleSpec, ModuleStatus};
use crate::registry::report::{FailingModule, StatusReport};

/// Catalog entry: descriptor plus runtime ownership state.
struct Entry {
    descriptor: ModuleDescriptor,
    /// Exclusively owned instance; released on unload.
    instance: Option<ModuleRef>,
    /// Monotonic per-module load attempt counter; stale completions are
    /// recognized by comparing against it.
    attempt_seq: u64,
    /// Present while a load is in flight; late callers await it instead of
    /// starting a duplicate load.
    inflight: Option<watch::Receiver<bool>>,
}

impl Entry {
    fn new(descriptor: ModuleDescriptor) -> Self {
        Self {
            descriptor,
            instance: None,
            attempt_seq: 0,
            inflight: None,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    modules: HashMap<String, Entry>,
    active: Option<String>,
}

/// Clears a module's in-flight marker when the loading caller finishes or is
/// cancelled. Without it, a caller dropped mid-load (e.g. wrapped in a
/// timeout) would leave the entry wedged in `Loading` forever.
struct InflightSlot {
    state: Arc<Mutex<RegistryState>>,
    id: String,
}

impl Drop for InflightSlot {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if let Some(entry) = state.modules.get_mut(&self.id) {
            entry.inflight = None;
        }
    }
}

fn lock(state: &Mutex<RegistryState>) -> MutexGuard<'_, RegistryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Event-driven catalog and lifecycle manager for modules.
pub struct ModuleRegistry {
    bus: EventBus,
    loader: Arc<dyn Loader>,
    cfg: RegistryConfig,
    state: Arc<Mutex<RegistryState>>,
    /// Self-handle for bus subscriptions; the bus must never keep a dropped
    /// registry alive.
    weak: Weak<Self>,
}

impl ModuleRegistry {
    /// Creates a new registry over the given bus and loader.
    pub fn new(bus: EventBus, loader: Arc<dyn Loader>, cfg: RegistryConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            bus,
            loader,
            cfg,
            state: Arc::new(Mutex::new(RegistryState::default())),
            weak: weak.clone(),
        })
    }

    /// The bus this registry publishes to and consumes from.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribes the registry to `navigation:module` and `module:reload`.
    ///
    /// Call once after construction. Handlers hold a weak reference, so the
    /// bus never keeps a dropped registry alive.
    pub fn attach(&self) {
        let weak = self.weak.clone();
        self.bus.subscribe_with(
            names::NAVIGATION_MODULE,
            HandlerFn::arc("registry", move |ev: Event| {
                let weak = weak.clone();
                async move { navigate(weak, ev).await }
            }),
            SubscribeOptions {
                owner: Some("registry".into()),
                ..Default::default()
            },
        );

        let weak = self.weak.clone();
        self.bus.subscribe_with(
            names::MODULE_RELOAD,
            HandlerFn::arc("registry", move |ev: Event| {
                let weak = weak.clone();
                async move {
                    let Some(registry) = weak.upgrade() else {
                        return Ok(Value::Null);
                    };
                    let id = payload_module_id(&ev)?;
                    registry
                        .reload(&id)
                        .await
                        .map_err(|err| HandlerError::failed(err.to_string()))?;
                    Ok(Value::Null)
                }
            }),
            SubscribeOptions {
                owner: Some("registry".into()),
                ..Default::default()
            },
        );
    }

    // ---------------------------
    // Catalog
    // ---------------------------

    /// Enters a module into the catalog.
    ///
    /// Returns `false` (and warns) when `id`, `name`, or `locator` is empty.
    /// Re-registering an existing id overwrites the descriptor (warns); any
    /// previous instance is released and, if it was active, the active slot
    /// is cleared. Emits `module:registered`.
    pub fn register(&self, spec: ModuleSpec) -> bool {
        if spec.id.is_empty() || spec.name.is_empty() || spec.locator.is_empty() {
            warn!(
                id = %spec.id,
                name = %spec.name,
                locator = %spec.locator,
                "rejecting module registration with missing fields"
            );
            return false;
        }

        let registered = json!({
            "moduleId": spec.id,
            "name": spec.name,
            "category": spec.category,
        });

        {
            let mut state = lock(&self.state);
            if state.modules.contains_key(&spec.id) {
                warn!(id = %spec.id, "overwriting existing module registration");
                if state.active.as_deref() == Some(spec.id.as_str()) {
                    state.active = None;
                }
            }
            let id = spec.id.clone();
            state
                .modules
                .insert(id, Entry::new(ModuleDescriptor::from_spec(spec)));
        }

        self.bus
            .publish(Event::new(names::MODULE_REGISTERED, registered).with_origin("registry"));
        true
    }

    /// True if `id` is in the catalog.
    pub fn is_registered(&self, id: &str) -> bool {
        lock(&self.state).modules.contains_key(id)
    }

    /// Returns a copy of the catalog record for `id`.
    pub fn descriptor(&self, id: &str) -> Option<ModuleDescriptor> {
        lock(&self.state)
            .modules
            .get(id)
            .map(|e| e.descriptor.clone())
    }

    /// Returns the lifecycle status for `id`.
    pub fn status(&self, id: &str) -> Option<ModuleStatus> {
        lock(&self.state)
            .modules
            .get(id)
            .map(|e| e.descriptor.status)
    }

    /// Returns the id of the currently active module, if any.
    pub fn active(&self) -> Option<String> {
        lock(&self.state).active.clone()
    }

    /// Returns the sorted list of registered module ids.
    pub fn ids(&self) -> Vec<String> {
        let state = lock(&self.state);
        let mut ids: Vec<String> = state.modules.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Loads `id` (and, depth-first, everything it depends on).
    ///
    /// Idempotent for loaded/active modules; concurrent calls for the same
    /// id collapse onto one in-flight load. See the module docs for the
    /// retry and deadline semantics.
    pub async fn load(&self, id: &str) -> Result<ModuleRef, RegistryError> {
        self.load_path(id, &[]).await
    }

    /// Activates `id`, loading it first if necessary and deactivating the
    /// previously active module. Enforces the single-active invariant.
    pub async fn activate(&self, id: &str) -> Result<(), RegistryError> {
        let instance = self.load(id).await?;

        let previous = {
            let state = lock(&self.state);
            match state.active.as_deref() {
                Some(active) if active == id => return Ok(()),
                Some(active) => {
                    let prev = state
                        .modules
                        .get(active)
                        .and_then(|e| e.instance.clone())
                        .map(|inst| (active.to_string(), inst));
                    prev
                }
                None => None,
            }
        };

        if let Some((prev_id, prev_instance)) = previous {
            // Demote the previous module before surfacing any hook error so
            // the single-active invariant holds even on failure.
            let hook = prev_instance.deactivate().await;
            {
                let mut state = lock(&self.state);
                state.active = None;
                if let Some(entry) = state.modules.get_mut(&prev_id) {
                    entry.descriptor.status = ModuleStatus::Loaded;
                }
            }
            match hook {
                Ok(()) => self.publish_lifecycle(names::MODULE_DEACTIVATED, &prev_id),
                Err(err) => {
                    self.publish_module_error(&prev_id, "deactivate", &err.message);
                    return Err(RegistryError::ActivationFailed {
                        id: prev_id,
                        reason: err.message,
                    });
                }
            }
        }

        if let Err(err) = instance.activate().await {
            self.publish_module_error(id, "activate", &err.message);
            return Err(RegistryError::ActivationFailed {
                id: id.to_string(),
                reason: err.message,
            });
        }

        {
            let mut state = lock(&self.state);
            state.active = Some(id.to_string());
            if let Some(entry) = state.modules.get_mut(id) {
                entry.descriptor.status = ModuleStatus::Active;
            }
        }
        self.publish_lifecycle(names::MODULE_ACTIVATED, id);
        Ok(())
    }

    /// Runs the deactivation hook and resets the module to `Loaded`.
    /// No-op when the module has no instance.
    pub async fn deactivate(&self, id: &str) -> Result<(), RegistryError> {
        let instance = {
            let state = lock(&self.state);
            let entry = state
                .modules
                .get(id)
                .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;
            match &entry.instance {
                Some(instance) => Arc::clone(instance),
                None => return Ok(()),
            }
        };

        let hook = instance.deactivate().await;
        {
            let mut state = lock(&self.state);
            if state.active.as_deref() == Some(id) {
                state.active = None;
            }
            if let Some(entry) = state.modules.get_mut(id) {
                entry.descriptor.status = ModuleStatus::Loaded;
            }
        }

        match hook {
            Ok(()) => {
                self.publish_lifecycle(names::MODULE_DEACTIVATED, id);
                Ok(())
            }
            Err(err) => {
                self.publish_module_error(id, "deactivate", &err.message);
                Err(RegistryError::ActivationFailed {
                    id: id.to_string(),
                    reason: err.message,
                })
            }
        }
    }

    /// Deactivates `id` if active, runs the cleanup hook, releases the
    /// instance, and resets the descriptor to `Registered`.
    ///
    /// A cleanup hook failure is reported via `module:error` but does not
    /// prevent the unload.
    pub async fn unload(&self, id: &str) -> Result<(), RegistryError> {
        if self.status(id) == Some(ModuleStatus::Active) {
            self.deactivate(id).await?;
        }

        let instance = {
            let mut state = lock(&self.state);
            let entry = state
                .modules
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;
            entry.instance.take()
        };

        if let Some(instance) = instance {
            if let Err(err) = instance.cleanup().await {
                self.publish_module_error(id, "cleanup", &err.message);
            }
        }

        let mut state = lock(&self.state);
        if let Some(entry) = state.modules.get_mut(id) {
            entry.descriptor.status = ModuleStatus::Registered;
            entry.descriptor.load_duration = None;
        }
        Ok(())
    }

    /// Explicit reload: resets the error count (clearing a retry-exhausted
    /// state), unloads, loads, and re-activates if `id` was the active
    /// module. Triggered by the `module:reload` event after [`attach`](Self::attach).
    pub async fn reload(&self, id: &str) -> Result<(), RegistryError> {
        let was_active = {
            let mut state = lock(&self.state);
            let entry = state
                .modules
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;
            entry.descriptor.error_count = 0;
            entry.descriptor.last_error = None;
            state.active.as_deref() == Some(id)
        };

        self.unload(id).await?;
        self.load(id).await?;
        if was_active {
            self.activate(id).await?;
        }
        Ok(())
    }

    // ---------------------------
    // Observability
    // ---------------------------

    /// Aggregate view of the catalog: counts, status histogram, average load
    /// duration, and modules with non-zero error counts.
    pub fn status_report(&self) -> StatusReport {
        let state = lock(&self.state);

        let mut by_status: HashMap<&'static str, usize> = HashMap::new();
        let mut durations = Vec::new();
        let mut failing = Vec::new();
        let mut loaded = 0;

        for entry in state.modules.values() {
            let d = &entry.descriptor;
            *by_status.entry(d.status.as_label()).or_default() += 1;
            if d.status.is_loaded() {
                loaded += 1;
            }
            if let Some(duration) = d.load_duration {
                durations.push(duration);
            }
            if d.error_count > 0 {
                failing.push(FailingModule {
                    id: d.id.clone(),
                    error_count: d.error_count,
                    last_error: d.last_error.clone(),
                });
            }
        }
        failing.sort_by(|a, b| a.id.cmp(&b.id));

        let avg_load_ms = if durations.is_empty() {
            None
        } else {
            let total: f64 = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
            Some(total / durations.len() as f64)
        };

        StatusReport {
            total: state.modules.len(),
            loaded,
            active: state.active.clone(),
            by_status: by_status
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            avg_load_ms,
            failing,
        }
    }

    // ---------------------------
    // Load internals
    // ---------------------------

    /// Recursive load with `path` carrying the ancestor chain for cycle
    /// detection.
    fn load_path<'a>(
        &'a self,
        id: &'a str,
        path: &'a [String],
    ) -> BoxFuture<'a, Result<ModuleRef, RegistryError>> {
        async move {
            if path.iter().any(|p| p == id) {
                return Err(RegistryError::DependencyCycle {
                    id: id.to_string(),
                    path: path.to_vec(),
                });
            }

            let ceiling = self.cfg.retry_ceiling_clamped();
            let mut waited = false;

            // Fast paths: already loaded, permanently failed, or in flight.
            let inflight_tx = loop {
                let wait_rx = {
                    let mut state = lock(&self.state);
                    let entry = state
                        .modules
                        .get_mut(id)
                        .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;

                    if let Some(rx) = entry.inflight.clone() {
                        Some(rx)
                    } else {
                        let d = &entry.descriptor;
                        match d.status {
                            ModuleStatus::Loaded | ModuleStatus::Active => {
                                return entry.instance.clone().ok_or_else(|| {
                                    RegistryError::LoadFailed {
                                        id: id.to_string(),
                                        reason: "loaded module has no instance".into(),
                                    }
                                });
                            }
                            ModuleStatus::Error if d.error_count >= ceiling => {
                                return Err(RegistryError::RetryExhausted {
                                    id: id.to_string(),
                                    attempts: d.error_count,
                                    reason: d.last_error.clone().unwrap_or_default(),
                                });
                            }
                            // Joined a load that just failed below the
                            // ceiling: surface its error instead of starting
                            // a competing load.
                            ModuleStatus::Error if waited => {
                                return Err(RegistryError::LoadFailed {
                                    id: id.to_string(),
                                    reason: d.last_error.clone().unwrap_or_default(),
                                });
                            }
                            _ => {
                                // Become the loading caller for this id.
                                let (tx, rx) = watch::channel(false);
                                entry.inflight = Some(rx);
                                entry.descriptor.status = ModuleStatus::Loading;
                                break tx;
                            }
                        }
                    }
                };

                if let Some(mut rx) = wait_rx {
                    if rx.changed().await.is_ok() {
                        waited = true;
                    } else {
                        // Sender dropped without completing: the loading
                        // caller was cancelled. Release the slot so the next
                        // iteration can take over the load.
                        let mut state = lock(&self.state);
                        if let Some(entry) = state.modules.get_mut(id) {
                            let leader_gone = entry
                                .inflight
                                .as_ref()
                                .map_or(false, |cur| cur.same_channel(&rx));
                            if leader_gone {
                                entry.inflight = None;
                            }
                        }
                    }
                }
            };

            // Dropped on every exit path, including cancellation of this
            // future, so leadership is always released.
            let _slot = InflightSlot {
                state: Arc::clone(&self.state),
                id: id.to_string(),
            };
            let result = self.drive_load(id, path).await;
            let _ = inflight_tx.send(true);
            result
        }
        .boxed()
    }

    /// Dependency resolution plus the deadline/retry attempt loop. Runs only
    /// in the single loading caller for `id`.
    async fn drive_load(&self, id: &str, path: &[String]) -> Result<ModuleRef, RegistryError> {
        let (locator, dependencies) = {
            let state = lock(&self.state);
            let entry = state
                .modules
                .get(id)
                .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;
            (
                entry.descriptor.locator.clone(),
                entry.descriptor.dependencies.clone(),
            )
        };

        let mut child_path = path.to_vec();
        child_path.push(id.to_string());

        for dep in &dependencies {
            if !self.is_registered(dep) {
                let err = RegistryError::MissingDependency {
                    id: id.to_string(),
                    dependency: dep.clone(),
                };
                self.record_load_failure(id, &err.to_string());
                return Err(err);
            }
            if let Err(dep_err) = self.load_path(dep, &child_path).await {
                let err = RegistryError::LoadFailed {
                    id: id.to_string(),
                    reason: format!("dependency '{dep}' failed: {dep_err}"),
                };
                self.record_load_failure(id, &err.to_string());
                return Err(err);
            }
        }

        let ceiling = self.cfg.retry_ceiling_clamped();
        loop {
            let seq = {
                let mut state = lock(&self.state);
                let entry = state
                    .modules
                    .get_mut(id)
                    .ok_or_else(|| RegistryError::NotRegistered { id: id.to_string() })?;
                entry.descriptor.status = ModuleStatus::Loading;
                entry.attempt_seq += 1;
                entry.attempt_seq
            };

            let started = Instant::now();
            match self.attempt_load(id, &locator, seq).await {
                Ok(instance) => match instance.initialize().await {
                    Ok(()) => {
                        let duration = started.elapsed();
                        {
                            let mut state = lock(&self.state);
                            if let Some(entry) = state.modules.get_mut(id) {
                                entry.instance = Some(Arc::clone(&instance));
                                entry.descriptor.status = ModuleStatus::Loaded;
                                entry.descriptor.load_duration = Some(duration);
                                entry.descriptor.last_error = None;
                            }
                        }
                        self.bus.publish(
                            Event::new(
                                names::MODULE_LOADED,
                                json!({
                                    "moduleId": id,
                                    "durationMs": duration.as_millis() as u64,
                                }),
                            )
                            .with_origin("registry"),
                        );
                        return Ok(instance);
                    }
                    Err(hook) => {
                        let err = RegistryError::LoadFailed {
                            id: id.to_string(),
                            reason: format!("initialize failed: {}", hook.message),
                        };
                        if let Some(exhausted) = self.note_attempt_failure(id, err, ceiling) {
                            return Err(exhausted);
                        }
                    }
                },
                Err(err) => {
                    if let Some(exhausted) = self.note_attempt_failure(id, err, ceiling) {
                        return Err(exhausted);
                    }
                }
            }

            tokio::time::sleep(self.cfg.retry_backoff).await;
        }
    }

    /// One loader invocation raced against the configured deadline.
    ///
    /// The deadline does not abort the loader: the spawned task keeps
    /// running, and its eventual completion is discarded as stale (the
    /// attempt has already been settled as a timeout).
    async fn attempt_load(
        &self,
        id: &str,
        locator: &str,
        seq: u64,
    ) -> Result<ModuleRef, RegistryError> {
        let loader = Arc::clone(&self.loader);
        let locator_owned = locator.to_string();
        let mut join =
            tokio::spawn(async move { loader.load(&locator_owned).await });

        let joined = match self.cfg.load_deadline() {
            Some(deadline) => match tokio::time::timeout(deadline, &mut join).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    self.discard_stale_completion(id, seq, join);
                    return Err(RegistryError::LoadTimeout {
                        id: id.to_string(),
                        timeout: deadline,
                    });
                }
            },
            None => join.await,
        };

        match joined {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(err)) => Err(RegistryError::LoadFailed {
                id: id.to_string(),
                reason: err.message,
            }),
            Err(join_err) => Err(RegistryError::LoadFailed {
                id: id.to_string(),
                reason: format!("loader panicked: {join_err}"),
            }),
        }
    }

    /// Awaits a timed-out attempt in the background and discards whatever it
    /// produces: the attempt was settled as a failure when the deadline
    /// fired, so by the time the loader finishes, `attempt_seq` has moved on
    /// (or the status is no longer `Loading`).
    fn discard_stale_completion(
        &self,
        id: &str,
        seq: u64,
        join: tokio::task::JoinHandle<Result<ModuleRef, ModuleError>>,
    ) {
        let id = id.to_string();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let completed_ok = matches!(join.await, Ok(Ok(_)));
            let state = lock(&state);
            let current = state.modules.get(&id).map(|e| e.attempt_seq);
            debug!(
                module = %id,
                attempt = seq,
                current_attempt = ?current,
                completed_ok,
                "stale load completion discarded"
            );
        });
    }

    /// Records a failed attempt; returns `Some(RetryExhausted)` once the
    /// ceiling is reached.
    fn note_attempt_failure(
        &self,
        id: &str,
        err: RegistryError,
        ceiling: u32,
    ) -> Option<RegistryError> {
        let reason = err.to_string();
        let count = self.record_load_failure(id, &reason);
        if count >= ceiling {
            Some(RegistryError::RetryExhausted {
                id: id.to_string(),
                attempts: count,
                reason,
            })
        } else {
            None
        }
    }

    /// Increments the error count, marks the module `Error`, and emits
    /// `module:error`. Returns the new error count.
    fn record_load_failure(&self, id: &str, reason: &str) -> u32 {
        let count = {
            let mut state = lock(&self.state);
            match state.modules.get_mut(id) {
                Some(entry) => {
                    entry.descriptor.error_count += 1;
                    entry.descriptor.status = ModuleStatus::Error;
                    entry.descriptor.last_error = Some(reason.to_string());
                    entry.descriptor.error_count
                }
                None => 0,
            }
        };
        self.bus.publish(
            Event::new(
                names::MODULE_ERROR,
                json!({
                    "moduleId": id,
                    "phase": "load",
                    "error": reason,
                    "errorCount": count,
                }),
            )
            .with_origin("registry"),
        );
        count
    }

    fn publish_lifecycle(&self, event: &'static str, id: &str) {
        self.bus
            .publish(Event::new(event, json!({ "moduleId": id })).with_origin("registry"));
    }

    fn publish_module_error(&self, id: &str, phase: &str, reason: &str) {
        self.bus.publish(
            Event::new(
                names::MODULE_ERROR,
                json!({
                    "moduleId": id,
                    "phase": phase,
                    "error": reason,
                }),
            )
            .with_origin("registry"),
        );
    }
}

/// `navigation:module` handler body: activate, re-emit failures as
/// `navigation:error`.
async fn navigate(
    weak: Weak<ModuleRegistry>,
    ev: Event,
) -> Result<Value, HandlerError> {
    let Some(registry) = weak.upgrade() else {
        return Ok(Value::Null);
    };
    let id = payload_module_id(&ev)?;
    if let Err(err) = registry.activate(&id).await {
        registry.bus.publish(
            Event::new(
                names::NAVIGATION_ERROR,
                json!({
                    "moduleId": id,
                    "error": err.to_string(),
                    "kind": err.as_label(),
                }),
            )
            .with_origin("registry"),
        );
    }
    Ok(Value::Null)
}

fn payload_module_id(ev: &Event) -> Result<String, HandlerError> {
    ev.payload
        .get("moduleId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            HandlerError::failed(format!("'{}' payload missing moduleId", ev.name))
        })
}
