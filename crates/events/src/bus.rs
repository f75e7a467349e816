//! Event publishing abstraction and the production topic-routed bus.
//!
//! ## Delivery model
//!
//! - **Single process, in memory**: no network hop, no durable queue
//! - **Fire and forget**: `emit` returns once every publish is enqueued in the
//!   subscriber mailboxes; it never waits for (or observes) handler results
//! - **Per-topic FIFO**: one mailbox sees one topic's messages in publish order;
//!   nothing is promised across topics or across workers
//! - **No subscribers is fine**: publishing to an empty topic is a no-op
//!
//! ```text
//! use case ─ construct ─▶ EventBus::emit ─▶ topic::resolve ─▶ PubSub::publish (typed)
//!                                        └─▶ LegacyTranslator ─▶ PubSub::publish (legacy)
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use mosaic_core::{DomainError, DomainResult};

use crate::event::DomainEvent;
use crate::legacy::{LegacyMessage, LegacyTranslator, NoLegacy};
use crate::pubsub::{PubSub, PubSubError};
use crate::topic;

/// What travels on a topic.
#[derive(Debug, Clone, PartialEq)]
pub enum Message<E> {
    /// A typed domain event (shared, never mutated).
    Event(Arc<E>),
    /// A bridged message in the pre-migration convention.
    Legacy(LegacyMessage),
}

impl<E> Message<E> {
    pub fn as_event(&self) -> Option<&E> {
        match self {
            Message::Event(event) => Some(event),
            Message::Legacy(_) => None,
        }
    }

    pub fn as_legacy(&self) -> Option<&LegacyMessage> {
        match self {
            Message::Event(_) => None,
            Message::Legacy(message) => Some(message),
        }
    }
}

/// Per-call emission options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Re-publish on legacy topics through the bus's translator.
    pub legacy_bridge: bool,
}

impl EmitOptions {
    pub fn without_legacy_bridge() -> Self {
        Self {
            legacy_bridge: false,
        }
    }
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            legacy_bridge: true,
        }
    }
}

/// Acknowledgement: everything was enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub event_id: Uuid,
    /// Typed topics the event was published on.
    pub topics: Vec<String>,
    /// Mailboxes reached across all typed topics.
    pub deliveries: usize,
    /// Legacy `(topic, message)` pairs published.
    pub legacy_messages: usize,
}

/// Domain event bus.
///
/// Use cases take the bus as a parameter (`bus: &B where B: EventBus`) so tests
/// can hand in a [`TestBus`](crate::TestBus) instead of the production bus.
///
/// ## Thread Safety
///
/// Implementations are `Send + Sync`; any thread may emit concurrently.
pub trait EventBus: Send + Sync {
    type Event: DomainEvent;
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    fn emit_with(&self, event: Self::Event, options: &EmitOptions) -> Result<Ack, Self::Error>;

    /// Emit with default options.
    fn emit<T>(&self, event: T) -> Result<Ack, Self::Error>
    where
        T: Into<Self::Event>,
    {
        self.emit_with(event.into(), &EmitOptions::default())
    }

    /// Emit each event in order. Relative order is only guaranteed per topic.
    fn emit_all<I>(&self, events: I, options: &EmitOptions) -> Result<Vec<Ack>, Self::Error>
    where
        I: IntoIterator,
        I::Item: Into<Self::Event>,
    {
        events
            .into_iter()
            .map(|event| self.emit_with(event.into(), options))
            .collect()
    }
}

impl<B> EventBus for &B
where
    B: EventBus + ?Sized,
{
    type Event = B::Event;
    type Error = B::Error;

    fn emit_with(&self, event: Self::Event, options: &EmitOptions) -> Result<Ack, Self::Error> {
        (**self).emit_with(event, options)
    }
}

impl<B> EventBus for Arc<B>
where
    B: EventBus + ?Sized,
{
    type Event = B::Event;
    type Error = B::Error;

    fn emit_with(&self, event: Self::Event, options: &EmitOptions) -> Result<Ack, Self::Error> {
        (**self).emit_with(event, options)
    }
}

/// Emit a copy of `event` with default options and hand the original back.
///
/// Bus failures become [`DomainError::Emission`] so use cases can stay on
/// [`DomainResult`].
pub fn emit_event<B, T>(bus: &B, event: T) -> DomainResult<T>
where
    B: EventBus + ?Sized,
    T: Clone + Into<B::Event>,
{
    bus.emit_with(event.clone().into(), &EmitOptions::default())
        .map_err(|e| DomainError::emission(e.to_string()))?;
    Ok(event)
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Publish failed due to internal lock poisoning.
    #[error("event bus registry lock poisoned")]
    Poisoned,
}

impl From<PubSubError> for BusError {
    fn from(err: PubSubError) -> Self {
        match err {
            PubSubError::Poisoned => BusError::Poisoned,
        }
    }
}

/// Production bus: resolves topics, publishes the typed event on each, then
/// publishes whatever the translator derives on legacy topics.
#[derive(Debug)]
pub struct TopicEventBus<E, T = NoLegacy> {
    pubsub: Arc<PubSub<Message<E>>>,
    translator: T,
    legacy_enabled: bool,
}

impl<E> TopicEventBus<E, NoLegacy> {
    /// A bus with no legacy bridge.
    pub fn typed_only(pubsub: Arc<PubSub<Message<E>>>) -> Self {
        Self::new(pubsub, NoLegacy)
    }
}

impl<E, T> TopicEventBus<E, T> {
    pub fn new(pubsub: Arc<PubSub<Message<E>>>, translator: T) -> Self {
        Self {
            pubsub,
            translator,
            legacy_enabled: true,
        }
    }

    /// Process-wide switch; per-call suppression goes through [`EmitOptions`].
    pub fn with_legacy_bridge(mut self, enabled: bool) -> Self {
        self.legacy_enabled = enabled;
        self
    }

    pub fn legacy_enabled(&self) -> bool {
        self.legacy_enabled
    }

    pub fn pubsub(&self) -> &Arc<PubSub<Message<E>>> {
        &self.pubsub
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }
}

impl<E, T> EventBus for TopicEventBus<E, T>
where
    E: DomainEvent,
    T: LegacyTranslator<E>,
{
    type Event = E;
    type Error = BusError;

    fn emit_with(&self, event: E, options: &EmitOptions) -> Result<Ack, BusError> {
        let topics = topic::resolve(&event);
        let event = Arc::new(event);

        let mut deliveries = 0;
        for topic in &topics {
            let reached = self.pubsub.publish(topic, Message::Event(event.clone()))?;
            trace!(topic = %topic, reached, "published typed event");
            deliveries += reached;
        }

        let mut legacy_messages = 0;
        if options.legacy_bridge && self.legacy_enabled {
            for (topic, message) in self.translator.translate(&event) {
                let tag = message.tag();
                let reached = self.pubsub.publish(&topic, Message::Legacy(message))?;
                trace!(topic = %topic, tag, reached, "published legacy message");
                legacy_messages += 1;
            }
        }

        debug!(
            event_kind = event.kind(),
            event_id = %event.event_id(),
            topics = topics.len(),
            deliveries,
            legacy_messages,
            "event emitted"
        );

        Ok(Ack {
            event_id: event.event_id(),
            topics: topics.into_iter().collect(),
            deliveries,
            legacy_messages,
        })
    }
}
