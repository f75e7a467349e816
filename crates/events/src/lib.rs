//! Typed domain events and the topic-routed bus that carries them.
//!
//! - [`domain_event!`] / [`event_union!`]: declare events and sum types over them
//! - [`topic`]: derive delivery topics from an event's own fields
//! - [`TopicEventBus`]: production in-process bus (typed + legacy publications)
//! - [`TestBus`]: deterministic recording bus for use-case tests
//! - [`Subscriber`]: contract implemented by reactive workers

pub mod bus;
pub mod definition;
pub mod envelope;
pub mod event;
pub mod legacy;
pub mod pubsub;
pub mod subscriber;
pub mod test_bus;
pub mod topic;

#[cfg(test)]
pub(crate) mod fixtures;

pub use bus::{emit_event, Ack, BusError, EmitOptions, EventBus, Message, TopicEventBus};
pub use definition::{derive_event_kind, snake_case, Attrs, EventDefinition, EventError};
pub use envelope::{BaseSlots, EventMeta, Slot};
pub use event::DomainEvent;
pub use legacy::{LegacyMessage, LegacyTranslator, NoLegacy};
pub use pubsub::{Inbox, PubSub, PubSubError, SubscriberId};
pub use subscriber::Subscriber;
pub use test_bus::{TestBus, TestBusError};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
