//! Infrastructure layer: system-wide event catalog, production bus wiring,
//! legacy bridge and the reactive worker runtime.

pub mod catalog;
pub mod config;
pub mod event_bus;
pub mod legacy_bridge;
pub mod workers;

#[cfg(test)]
mod integration_tests;

pub use catalog::AnyEvent;
pub use config::{BusConfig, WorkerConfig};
pub use event_bus::{EventSystem, ProductionBus, ProductionPubSub};
pub use legacy_bridge::{legacy_audit, LegacyBridge, LegacyTopicStatus};
pub use workers::{SubscriberWorker, WorkerHandle, WorkerStats};
