//! In-process topic registry (the host publish/subscribe primitive).
//!
//! - No IO / no async
//! - One mailbox ([`Inbox`]) per subscriber, shared by all of its topics
//! - Publishes on one topic are serialised, so each mailbox sees a topic's
//!   messages in publish order
//! - Publishing to a topic nobody listens on is a no-op

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, mpsc};
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PubSubError {
    /// The registry lock was poisoned by a panicking thread.
    #[error("pubsub registry lock poisoned")]
    Poisoned,
}

/// Identity of a mailbox in the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A subscriber's mailbox.
///
/// Subscribe it to any number of topics; everything published on them lands
/// here. Designed for single-threaded consumption by the owning worker.
#[derive(Debug)]
pub struct Inbox<M> {
    id: SubscriberId,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M> Inbox<M> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            id: SubscriberId::new(),
            sender,
            receiver,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

impl<M> Default for Inbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Registration<M> {
    id: SubscriberId,
    sender: mpsc::Sender<M>,
}

type Registry<M> = HashMap<String, Vec<Registration<M>>>;

/// Topic → mailbox registry.
///
/// All mutation happens under one lock, so concurrent `subscribe`,
/// `unsubscribe` and `publish` calls are serialised.
#[derive(Debug)]
pub struct PubSub<M> {
    topics: Mutex<Registry<M>>,
}

impl<M> PubSub<M> {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry<M>>, PubSubError> {
        self.topics.lock().map_err(|_| PubSubError::Poisoned)
    }

    /// Register `inbox` on `topic`. Subscribing twice to the same topic is a no-op.
    pub fn subscribe(&self, topic: impl Into<String>, inbox: &Inbox<M>) -> Result<(), PubSubError> {
        let mut topics = self.registry()?;
        let registrations = topics.entry(topic.into()).or_default();

        if !registrations.iter().any(|r| r.id == inbox.id) {
            registrations.push(Registration {
                id: inbox.id,
                sender: inbox.sender.clone(),
            });
        }
        Ok(())
    }

    /// Remove `id` from `topic`. Returns whether it was registered.
    pub fn unsubscribe(&self, topic: &str, id: SubscriberId) -> Result<bool, PubSubError> {
        let mut topics = self.registry()?;
        let Some(registrations) = topics.get_mut(topic) else {
            return Ok(false);
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            topics.remove(topic);
        }
        Ok(removed)
    }

    /// Remove `id` from every topic. Returns how many registrations were dropped.
    pub fn unsubscribe_all(&self, id: SubscriberId) -> Result<usize, PubSubError> {
        let mut topics = self.registry()?;
        let mut removed = 0;

        topics.retain(|_, registrations| {
            let before = registrations.len();
            registrations.retain(|r| r.id != id);
            removed += before - registrations.len();
            !registrations.is_empty()
        });
        Ok(removed)
    }

    pub fn subscriber_count(&self, topic: &str) -> Result<usize, PubSubError> {
        Ok(self.registry()?.get(topic).map_or(0, Vec::len))
    }

    /// Topics with at least one registration, sorted.
    pub fn topics(&self) -> Result<Vec<String>, PubSubError> {
        let mut topics: Vec<String> = self.registry()?.keys().cloned().collect();
        topics.sort();
        Ok(topics)
    }
}

impl<M: Clone> PubSub<M> {
    /// Fan `message` out to every mailbox on `topic`. Returns the number of
    /// mailboxes it was enqueued to.
    pub fn publish(&self, topic: &str, message: M) -> Result<usize, PubSubError> {
        let mut topics = self.registry()?;
        let Some(registrations) = topics.get_mut(topic) else {
            return Ok(0);
        };

        // Drop mailboxes whose receiver is gone while publishing.
        registrations.retain(|r| r.sender.send(message.clone()).is_ok());
        let delivered = registrations.len();
        if registrations.is_empty() {
            topics.remove(topic);
        }
        Ok(delivered)
    }
}

impl<M> Default for PubSub<M> {
    fn default() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
        }
    }
}
