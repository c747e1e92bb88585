use std::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::config::{BusConfig, RegistryConfig};
use crate::error::{ModuleError, RegistryError};
use crate::events::{names, Event, EventBus};
use crate::modules::{Loader, LoaderFn, Module, ModuleRef, ModuleSpec, ModuleStatus};
use crate::registry::ModuleRegistry;

type HookLog = Arc<Mutex<Vec<String>>>;

/// Module that records every hook invocation into a shared log.
struct TracedModule {
    id: String,
    log: HookLog,
    fail_activate: bool,
}

impl TracedModule {
    fn arc(id: impl Into<String>, log: &HookLog) -> ModuleRef {
        Arc::new(Self {
            id: id.into(),
            log: Arc::clone(log),
            fail_activate: false,
        })
    }

    fn push(&self, hook: &str) {
        self.log.lock().unwrap().push(format!("{hook}:{}", self.id));
    }
}

#[async_trait]
impl Module for TracedModule {
    async fn initialize(&self) -> Result<(), ModuleError> {
        self.push("init");
        Ok(())
    }

    async fn activate(&self) -> Result<(), ModuleError> {
        self.push("activate");
        if self.fail_activate {
            Err(ModuleError::new("activate hook failed"))
        } else {
            Ok(())
        }
    }

    async fn deactivate(&self) -> Result<(), ModuleError> {
        self.push("deactivate");
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), ModuleError> {
        self.push("cleanup");
        Ok(())
    }
}

/// Loader producing traced modules, logging each load by locator.
fn traced_loader(log: &HookLog) -> Arc<dyn Loader> {
    let log = Arc::clone(log);
    LoaderFn::arc(move |locator: String| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("load:{locator}"));
            Ok(TracedModule::arc(locator, &log))
        }
    })
}

fn fast_cfg() -> RegistryConfig {
    RegistryConfig {
        load_timeout: Duration::from_secs(1),
        retry_ceiling: 3,
        retry_backoff: Duration::from_millis(10),
    }
}

fn harness(loader: Arc<dyn Loader>) -> (EventBus, Arc<ModuleRegistry>) {
    let bus = EventBus::new(BusConfig::default());
    let registry = ModuleRegistry::new(bus.clone(), loader, fast_cfg());
    (bus, registry)
}

fn spec(id: &str, deps: &[&str]) -> ModuleSpec {
    ModuleSpec::new(id, id.to_uppercase(), id).with_dependencies(deps.iter().copied())
}

/// Lets spawned drains, handlers, and backoff timers settle. The 1ms sleeps
/// auto-advance under a paused clock.
async fn settle() {
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// ---------------------------
// Registration
// ---------------------------

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));

    assert!(!registry.register(ModuleSpec::new("", "X", "x")));
    assert!(!registry.register(ModuleSpec::new("x", "", "x")));
    assert!(!registry.register(ModuleSpec::new("x", "X", "")));
    assert!(registry.register(ModuleSpec::new("x", "X", "x")));
    assert!(registry.is_registered("x"));
}

#[tokio::test]
async fn test_register_emits_event_and_overwrite_replaces_descriptor() {
    let log = HookLog::default();
    let (bus, registry) = harness(traced_loader(&log));

    assert!(registry.register(spec("chart", &[]).with_category("viz")));
    let history = bus.history(Some(names::MODULE_REGISTERED));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event.payload["moduleId"], "chart");

    // Overwrite keeps the id but replaces the descriptor.
    assert!(registry.register(spec("chart", &[]).with_category("charts")));
    let d = registry.descriptor("chart").unwrap();
    assert_eq!(d.category, "charts");
    assert_eq!(d.status, ModuleStatus::Registered);
}

// ---------------------------
// Loading
// ---------------------------

#[tokio::test]
async fn test_load_is_idempotent_for_loaded_modules() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("a", &[]));

    let first = registry.load("a").await.unwrap();
    let second = registry.load("a").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let loads: Vec<_> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|l| l.starts_with("load:"))
        .cloned()
        .collect();
    assert_eq!(loads, vec!["load:a"]);
}

#[tokio::test]
async fn test_dependencies_load_depth_first() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("c", &[]));
    registry.register(spec("b", &["c"]));
    registry.register(spec("a", &["b"]));

    registry.load("a").await.unwrap();

    let loads: Vec<_> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|l| l.starts_with("load:"))
        .cloned()
        .collect();
    assert_eq!(loads, vec!["load:c", "load:b", "load:a"]);
    for id in ["a", "b", "c"] {
        assert_eq!(registry.status(id), Some(ModuleStatus::Loaded));
    }
}

#[tokio::test]
async fn test_unknown_module_is_not_registered_error() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    let err = registry.load("ghost").await.unwrap_err();
    assert!(matches!(err, RegistryError::NotRegistered { .. }));
}

#[tokio::test]
async fn test_missing_dependency_is_fatal_for_dependent() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("a", &["ghost"]));

    let err = registry.load("a").await.unwrap_err();
    assert!(matches!(err, RegistryError::MissingDependency { .. }));
    assert_eq!(registry.status("a"), Some(ModuleStatus::Error));
}

#[tokio::test]
async fn test_dependency_cycle_is_detected() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("a", &["b"]));
    registry.register(spec("b", &["a"]));

    let err = registry.load("a").await.unwrap_err();
    assert!(err.to_string().contains("cycle"), "got: {err}");
}

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling_then_immediate_failure_without_new_attempts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let attempts2 = Arc::clone(&attempts);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |_locator: String| {
        let attempts = Arc::clone(&attempts2);
        async move {
            attempts.fetch_add(1, AtomicOrdering::SeqCst);
            Err::<ModuleRef, _>(ModuleError::new("boom"))
        }
    });
    let (_bus, registry) = harness(loader);
    registry.register(spec("a", &[]));

    let err = registry.load("a").await.unwrap_err();
    match err {
        RegistryError::RetryExhausted { attempts: n, .. } => assert_eq!(n, 3),
        other => panic!("expected RetryExhausted, got {other}"),
    }
    assert_eq!(attempts.load(AtomicOrdering::SeqCst), 3);
    assert_eq!(registry.status("a"), Some(ModuleStatus::Error));

    // A further load fails immediately, without a new attempt.
    let err = registry.load("a").await.unwrap_err();
    assert!(matches!(err, RegistryError::RetryExhausted { .. }));
    assert_eq!(attempts.load(AtomicOrdering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_load_timeout_counts_as_failure() {
    let loader: Arc<dyn Loader> = LoaderFn::arc(|_locator: String| {
        futures::future::pending::<Result<ModuleRef, ModuleError>>()
    });
    let bus = EventBus::new(BusConfig::default());
    let registry = ModuleRegistry::new(
        bus,
        loader,
        RegistryConfig {
            load_timeout: Duration::from_millis(50),
            retry_ceiling: 2,
            retry_backoff: Duration::from_millis(10),
        },
    );
    registry.register(spec("slow", &[]));

    let err = registry.load("slow").await.unwrap_err();
    match err {
        RegistryError::RetryExhausted {
            attempts, reason, ..
        } => {
            assert_eq!(attempts, 2);
            assert!(reason.contains("timed out"), "got: {reason}");
        }
        other => panic!("expected RetryExhausted, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_stale_completion_does_not_clobber_retry_result() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let calls = Arc::clone(&calls2);
        let log = Arc::clone(&log2);
        async move {
            // First attempt straggles past the deadline, later attempts are
            // instant.
            if calls.fetch_add(1, AtomicOrdering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(TracedModule::arc(locator, &log))
        }
    });
    let bus = EventBus::new(BusConfig::default());
    let registry = ModuleRegistry::new(
        bus,
        loader,
        RegistryConfig {
            load_timeout: Duration::from_millis(100),
            retry_ceiling: 3,
            retry_backoff: Duration::from_millis(10),
        },
    );
    registry.register(spec("a", &[]));

    registry.load("a").await.unwrap();
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
    let d = registry.descriptor("a").unwrap();
    assert_eq!(d.status, ModuleStatus::Loaded);
    assert_eq!(d.error_count, 1);

    // Let the straggler finish; the recorded result must be untouched.
    tokio::time::sleep(Duration::from_secs(20)).await;
    let d = registry.descriptor("a").unwrap();
    assert_eq!(d.status, ModuleStatus::Loaded);
    assert_eq!(d.error_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_loads_collapse_onto_one_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let calls = Arc::clone(&calls2);
        let log = Arc::clone(&log2);
        async move {
            calls.fetch_add(1, AtomicOrdering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(TracedModule::arc(locator, &log))
        }
    });
    let (_bus, registry) = harness(loader);
    registry.register(spec("a", &[]));

    let (first, second) = tokio::join!(registry.load("a"), registry.load("a"));
    let first = first.unwrap();
    let second = second.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_load_does_not_wedge_later_loads() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let calls = Arc::clone(&calls2);
        let log = Arc::clone(&log2);
        async move {
            // First call never finishes; later calls are instant.
            if calls.fetch_add(1, AtomicOrdering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(TracedModule::arc(locator, &log))
        }
    });
    let bus = EventBus::new(BusConfig::default());
    let registry = ModuleRegistry::new(
        bus,
        loader,
        RegistryConfig {
            load_timeout: Duration::ZERO,
            retry_ceiling: 3,
            retry_backoff: Duration::from_millis(10),
        },
    );
    registry.register(spec("a", &[]));

    // The caller applies its own deadline and gives up on the first load.
    let cancelled =
        tokio::time::timeout(Duration::from_millis(100), registry.load("a")).await;
    assert!(cancelled.is_err());

    // The in-flight slot was released: a fresh load takes over and finishes.
    let loaded = tokio::time::timeout(Duration::from_secs(5), registry.load("a"))
        .await
        .expect("load must not hang after a cancelled caller");
    loaded.unwrap();
    assert_eq!(registry.status("a"), Some(ModuleStatus::Loaded));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_waiter_takes_over_when_loading_caller_is_cancelled() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let calls = Arc::clone(&calls2);
        let log = Arc::clone(&log2);
        async move {
            if calls.fetch_add(1, AtomicOrdering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(TracedModule::arc(locator, &log))
        }
    });
    let bus = EventBus::new(BusConfig::default());
    let registry = ModuleRegistry::new(
        bus,
        loader,
        RegistryConfig {
            load_timeout: Duration::ZERO,
            retry_ceiling: 3,
            retry_backoff: Duration::from_millis(10),
        },
    );
    registry.register(spec("a", &[]));

    // A second caller joins while the first load is in flight; the first
    // caller then gives up. The joined caller must take over, not wait on
    // the abandoned load forever.
    let (cancelled, taken_over) = tokio::join!(
        tokio::time::timeout(Duration::from_millis(100), registry.load("a")),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.load("a").await
        }
    );

    assert!(cancelled.is_err());
    taken_over.unwrap();
    assert_eq!(registry.status("a"), Some(ModuleStatus::Loaded));
    assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
}

// ---------------------------
// Activation lifecycle
// ---------------------------

#[tokio::test]
async fn test_single_active_invariant() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("x", &[]));
    registry.register(spec("y", &[]));

    registry.activate("x").await.unwrap();
    registry.activate("y").await.unwrap();

    assert_eq!(registry.status("x"), Some(ModuleStatus::Loaded));
    assert_eq!(registry.status("y"), Some(ModuleStatus::Active));
    assert_eq!(registry.active(), Some("y".to_string()));

    // x was deactivated before y was activated.
    let hooks = log.lock().unwrap();
    let deact = hooks.iter().position(|h| h == "deactivate:x").unwrap();
    let act = hooks.iter().position(|h| h == "activate:y").unwrap();
    assert!(deact < act);
}

#[tokio::test]
async fn test_activating_the_active_module_is_a_no_op() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("x", &[]));

    registry.activate("x").await.unwrap();
    let hooks_before = log.lock().unwrap().len();
    registry.activate("x").await.unwrap();
    assert_eq!(log.lock().unwrap().len(), hooks_before);
}

#[tokio::test]
async fn test_activation_failure_is_reported_and_rethrown() {
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let log = Arc::clone(&log2);
        async move {
            Ok(Arc::new(TracedModule {
                id: locator,
                log: Arc::clone(&log),
                fail_activate: true,
            }) as ModuleRef)
        }
    });
    let (bus, registry) = harness(loader);
    registry.register(spec("bad", &[]));

    let err = registry.activate("bad").await.unwrap_err();
    assert!(matches!(err, RegistryError::ActivationFailed { .. }));
    assert_eq!(registry.status("bad"), Some(ModuleStatus::Loaded));
    assert_eq!(registry.active(), None);

    let errors = bus.history(Some(names::MODULE_ERROR));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].event.payload["phase"], "activate");
}

#[tokio::test]
async fn test_deactivate_without_instance_is_a_no_op() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("a", &[]));

    registry.deactivate("a").await.unwrap();
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(registry.status("a"), Some(ModuleStatus::Registered));
}

#[tokio::test]
async fn test_unload_releases_instance_and_resets_status() {
    let log = HookLog::default();
    let (_bus, registry) = harness(traced_loader(&log));
    registry.register(spec("a", &[]));

    registry.activate("a").await.unwrap();
    registry.unload("a").await.unwrap();

    assert_eq!(registry.status("a"), Some(ModuleStatus::Registered));
    assert_eq!(registry.active(), None);
    let hooks = log.lock().unwrap();
    assert!(hooks.contains(&"deactivate:a".to_string()));
    assert!(hooks.contains(&"cleanup:a".to_string()));
}

// ---------------------------
// Bus integration
// ---------------------------

#[tokio::test]
async fn test_navigation_event_activates_module() {
    let log = HookLog::default();
    let (bus, registry) = harness(traced_loader(&log));
    registry.attach();
    registry.register(spec("dash", &[]));

    bus.publish(Event::new(
        names::NAVIGATION_MODULE,
        json!({ "moduleId": "dash" }),
    ));
    settle().await;

    assert_eq!(registry.status("dash"), Some(ModuleStatus::Active));
}

#[tokio::test]
async fn test_navigation_failure_is_re_emitted_as_navigation_error() {
    let log = HookLog::default();
    let (bus, registry) = harness(traced_loader(&log));
    registry.attach();

    bus.publish(Event::new(
        names::NAVIGATION_MODULE,
        json!({ "moduleId": "ghost" }),
    ));
    settle().await;

    let errors = bus.history(Some(names::NAVIGATION_ERROR));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].event.payload["moduleId"], "ghost");
    assert_eq!(errors[0].event.payload["kind"], "module_not_registered");
}

#[tokio::test(start_paused = true)]
async fn test_reload_event_resets_error_state_and_reloads() {
    let fail = Arc::new(AtomicBool::new(true));
    let fail2 = Arc::clone(&fail);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let fail = Arc::clone(&fail2);
        let log = Arc::clone(&log2);
        async move {
            if fail.load(AtomicOrdering::SeqCst) {
                Err(ModuleError::new("flaky"))
            } else {
                Ok(TracedModule::arc(locator, &log))
            }
        }
    });
    let (bus, registry) = harness(loader);
    registry.attach();
    registry.register(spec("a", &[]));

    let err = registry.load("a").await.unwrap_err();
    assert!(matches!(err, RegistryError::RetryExhausted { .. }));

    fail.store(false, AtomicOrdering::SeqCst);
    bus.publish(Event::new(names::MODULE_RELOAD, json!({ "moduleId": "a" })));
    settle().await;

    let d = registry.descriptor("a").unwrap();
    assert_eq!(d.status, ModuleStatus::Loaded);
    assert_eq!(d.error_count, 0);
}

#[tokio::test]
async fn test_reload_reactivates_previously_active_module() {
    let log = HookLog::default();
    let (bus, registry) = harness(traced_loader(&log));
    registry.attach();
    registry.register(spec("a", &[]));
    registry.activate("a").await.unwrap();

    bus.publish(Event::new(names::MODULE_RELOAD, json!({ "moduleId": "a" })));
    settle().await;

    assert_eq!(registry.active(), Some("a".to_string()));
    let activations = log
        .lock()
        .unwrap()
        .iter()
        .filter(|h| *h == "activate:a")
        .count();
    assert_eq!(activations, 2);
}

// ---------------------------
// Reporting & end-to-end
// ---------------------------

#[tokio::test(start_paused = true)]
async fn test_status_report_aggregates_catalog() {
    let fail = Arc::new(AtomicBool::new(false));
    let fail2 = Arc::clone(&fail);
    let log = HookLog::default();
    let log2 = Arc::clone(&log);
    let loader: Arc<dyn Loader> = LoaderFn::arc(move |locator: String| {
        let fail = Arc::clone(&fail2);
        let log = Arc::clone(&log2);
        async move {
            if fail.load(AtomicOrdering::SeqCst) {
                Err(ModuleError::new("down"))
            } else {
                Ok(TracedModule::arc(locator, &log))
            }
        }
    });
    let (_bus, registry) = harness(loader);
    registry.register(spec("ok", &[]));
    registry.register(spec("bad", &[]));
    registry.register(spec("idle", &[]));

    registry.activate("ok").await.unwrap();
    fail.store(true, AtomicOrdering::SeqCst);
    let _ = registry.load("bad").await;

    let report = registry.status_report();
    assert_eq!(report.total, 3);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.active, Some("ok".to_string()));
    assert_eq!(report.by_status["active"], 1);
    assert_eq!(report.by_status["error"], 1);
    assert_eq!(report.by_status["registered"], 1);
    assert!(report.avg_load_ms.is_some());
    assert_eq!(report.failing.len(), 1);
    assert_eq!(report.failing[0].id, "bad");
    assert_eq!(report.failing[0].error_count, 3);
}

#[tokio::test]
async fn test_dashboard_scenario_orders_lifecycle_events() {
    let log = HookLog::default();
    let (bus, registry) = harness(traced_loader(&log));
    registry.register(spec("chart", &[]));
    registry.register(spec("dashboard", &["chart"]));

    registry.activate("dashboard").await.unwrap();

    assert_eq!(registry.status("chart"), Some(ModuleStatus::Loaded));
    assert_eq!(registry.status("dashboard"), Some(ModuleStatus::Active));

    let loaded = bus.history(Some(names::MODULE_LOADED));
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].event.payload["moduleId"], "chart");
    assert_eq!(loaded[1].event.payload["moduleId"], "dashboard");

    let activated = bus.history(Some(names::MODULE_ACTIVATED));
    assert_eq!(activated.len(), 1);
    assert_eq!(activated[0].event.payload["moduleId"], "dashboard");
    assert!(loaded[1].event.seq < activated[0].event.seq);
}
