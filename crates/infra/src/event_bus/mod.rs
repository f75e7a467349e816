//! Production wiring of the event bus.
//!
//! One [`PubSub`] registry per process, shared by the bus (publisher side)
//! and every [`SubscriberWorker`] (subscriber side).

use std::sync::Arc;

use mosaic_events::{Message, PubSub, PubSubError, Subscriber, TopicEventBus};
use tracing::info;

use crate::catalog::AnyEvent;
use crate::config::{BusConfig, WorkerConfig};
use crate::legacy_bridge::{legacy_audit, LegacyBridge, LegacyTopicStatus};
use crate::workers::{SubscriberWorker, WorkerHandle};

pub type ProductionPubSub = PubSub<Message<AnyEvent>>;

/// Topic-routed bus over the full catalog, bridged to legacy topics.
pub type ProductionBus = TopicEventBus<AnyEvent, LegacyBridge>;

/// The shared registry plus the bus publishing into it.
#[derive(Debug, Clone)]
pub struct EventSystem {
    pubsub: Arc<ProductionPubSub>,
    bus: Arc<ProductionBus>,
}

impl EventSystem {
    pub fn new(config: &BusConfig) -> Self {
        let pubsub = Arc::new(ProductionPubSub::new());
        let bus = TopicEventBus::new(pubsub.clone(), LegacyBridge)
            .with_legacy_bridge(config.legacy_bridge);
        info!(legacy_bridge = config.legacy_bridge, "event system initialised");

        Self {
            pubsub,
            bus: Arc::new(bus),
        }
    }

    pub fn from_env() -> Self {
        Self::new(&BusConfig::from_env())
    }

    pub fn bus(&self) -> &Arc<ProductionBus> {
        &self.bus
    }

    pub fn pubsub(&self) -> &Arc<ProductionPubSub> {
        &self.pubsub
    }

    /// Start a supervised worker on this system's registry.
    pub fn spawn_worker<S, F>(&self, config: WorkerConfig, factory: F) -> anyhow::Result<WorkerHandle>
    where
        S: Subscriber<AnyEvent>,
        F: FnMut() -> anyhow::Result<S> + Send + 'static,
    {
        SubscriberWorker::spawn(self.pubsub.clone(), config, factory)
    }

    /// Legacy topics that still have listeners.
    pub fn legacy_audit(&self) -> Result<Vec<LegacyTopicStatus>, PubSubError> {
        legacy_audit(&*self.pubsub)
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new(&BusConfig::default())
    }
}
