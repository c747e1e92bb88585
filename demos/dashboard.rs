//! # Example: dashboard
//!
//! A small dashboard application wired together through the bus: modules are
//! registered with dependencies, navigation happens by publishing events, and
//! the registry reacts by loading and activating modules.
//!
//! Demonstrates:
//! - Implementing [`Module`] with lifecycle hooks.
//! - A [`StaticLoader`] mapping locators to module factories.
//! - Event-driven navigation (`navigation:module`) and reload (`module:reload`).
//! - The lifecycle event stream and the aggregate status report.
//!
//! ## Flow
//! ```text
//! register(chart), register(dashboard deps=[chart])
//!     │
//! publish(navigation:module { moduleId: "dashboard" })
//!     ├─► load(chart) ──► module:loaded { chart }
//!     ├─► load(dashboard) ──► module:loaded { dashboard }
//!     └─► activate(dashboard) ──► module:activated { dashboard }
//!
//! publish(navigation:module { moduleId: "chart" })
//!     ├─► deactivate(dashboard) ──► module:deactivated { dashboard }
//!     └─► activate(chart) ──► module:activated { chart }
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example dashboard
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use corebus::{
    names, BusConfig, Event, EventBus, Module, ModuleError, ModuleRef, ModuleRegistry,
    ModuleSpec, RegistryConfig, StaticLoader,
};

/// A widget that announces its lifecycle transitions.
struct Widget {
    label: &'static str,
}

#[async_trait]
impl Module for Widget {
    async fn initialize(&self) -> Result<(), ModuleError> {
        println!("[{}] initialize", self.label);
        Ok(())
    }

    async fn activate(&self) -> Result<(), ModuleError> {
        println!("[{}] activate", self.label);
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), ModuleError> {
        println!("[{}] deactivate", self.label);
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), ModuleError> {
        println!("[{}] cleanup", self.label);
        Ok(())
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

    // 1. The shared bus.
    let bus = EventBus::new(BusConfig::default());

    // 2. A loader mapping locators to widget factories.
    let loader = Arc::new(
        StaticLoader::new()
            .with("widgets/chart", || {
                Arc::new(Widget { label: "chart" }) as ModuleRef
            })
            .with("widgets/dashboard", || {
                Arc::new(Widget { label: "dashboard" }) as ModuleRef
            }),
    );

    // 3. Registry, subscribed to navigation and reload events.
    let registry = ModuleRegistry::new(bus.clone(), loader, RegistryConfig::default());
    registry.attach();

    registry.register(ModuleSpec::new("chart", "Chart", "widgets/chart").with_category("viz"));
    registry.register(
        ModuleSpec::new("dashboard", "Dashboard", "widgets/dashboard")
            .with_category("analytics")
            .with_dependencies(["chart"]),
    );

    // 4. Observe the lifecycle stream.
    bus.subscribe(
        names::MODULE_ACTIVATED,
        corebus::HandlerFn::arc("observer", |ev: Event| async move {
            println!("[observer] {} now active", ev.payload["moduleId"]);
            Ok(serde_json::Value::Null)
        }),
    );

    // 5. Navigate by event; wait_for confirms the activation landed.
    bus.publish(Event::new(
        names::NAVIGATION_MODULE,
        json!({ "moduleId": "dashboard" }),
    ));
    bus.wait_for(names::MODULE_ACTIVATED, Duration::from_secs(2))
        .await?;

    // 6. Navigate away; dashboard is deactivated, chart takes over.
    bus.publish(Event::new(
        names::NAVIGATION_MODULE,
        json!({ "moduleId": "chart" }),
    ));
    bus.wait_for(names::MODULE_DEACTIVATED, Duration::from_secs(2))
        .await?;

    // 7. Reload the chart module in place.
    bus.publish(Event::new(names::MODULE_RELOAD, json!({ "moduleId": "chart" })));
    bus.wait_for(names::MODULE_LOADED, Duration::from_secs(2))
        .await?;

    let report = registry.status_report();
    println!(
        "modules: {} total, {} loaded, active = {:?}",
        report.total, report.loaded, report.active
    );
    for entry in bus.history(None) {
        println!("history: #{:<3} {}", entry.event.seq, entry.event.name);
    }
    Ok(())
}
