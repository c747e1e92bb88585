//! Events: data model, canonical names, and the bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to named events flowing between modules, the registry,
//! and application code.
//!
//! ## Contents
//! - [`Event`], [`HistoryEntry`] event payload and history snapshots
//! - [`EventBus`] priority-ordered publish/subscribe with history and stats
//! - [`names`] canonical event-name constants used across the core
//!
//! ## Quick reference
//! - **Publishers**: `ModuleRegistry` (lifecycle events), module instances
//!   (domain events such as `data:updated`), the bus itself (`system:error`).
//! - **Consumers**: `ModuleRegistry` (`navigation:module`, `module:reload`)
//!   and any application handler registered via `subscribe`.

mod bus;
mod event;
pub mod names;

pub use bus::{
    BusStats, EventBus, EventStats, HandlerFault, SubscribeOptions, SubscriberInfo,
    SubscriptionHandle,
};
pub use event::{Event, HistoryEntry};
