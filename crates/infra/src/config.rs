//! Runtime configuration for the bus and the reactive workers.
//!
//! Values come from the environment with lenient parsing: anything that does
//! not parse falls back to the default.

use std::time::Duration;

/// Production bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Re-publish typed events on legacy topics (`MOSAIC_LEGACY_BRIDGE`).
    pub legacy_bridge: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            legacy_bridge: true,
        }
    }
}

impl BusConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let legacy_bridge = lookup("MOSAIC_LEGACY_BRIDGE")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0"))
            .unwrap_or(true);

        Self { legacy_bridge }
    }

    pub fn with_legacy_bridge(mut self, enabled: bool) -> Self {
        self.legacy_bridge = enabled;
        self
    }
}

/// Reactive worker settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Thread name and `worker` log field
    pub name: String,
    /// How long to block on the inbox before checking for shutdown
    pub tick: Duration,
    /// Restarts allowed after a handler panic before the worker gives up
    pub max_restarts: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "subscriber-worker".to_string(),
            tick: Duration::from_millis(250),
            max_restarts: 3,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let max_restarts = lookup("MOSAIC_WORKER_MAX_RESTARTS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.max_restarts);

        Self {
            max_restarts,
            ..defaults
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = max;
        self
    }
}
