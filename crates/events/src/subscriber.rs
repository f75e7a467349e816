//! Subscriber Contract.
//!
//! A component that wants durable, topic-driven reactions implements
//! [`Subscriber`]; the host runtime (`mosaic-infra`'s `SubscriberWorker`)
//! supplies the long-lived worker around it.

/// Reactive worker contract over a bus carrying events of type `E`.
///
/// - On every (re)start the worker subscribes to [`subscriptions`](Self::subscriptions).
/// - Messages that convert into [`Self::Event`] are passed to [`handle`](Self::handle);
///   anything else (other event types, legacy traffic) is ignored.
/// - A handler error is logged and the worker moves on. No retry, no dead letters.
pub trait Subscriber<E>: Send + 'static {
    /// The event shapes this worker reacts to.
    type Event: TryFrom<E> + Send;

    type Error: core::fmt::Debug;

    /// Stable name used for the worker thread and log fields.
    fn name(&self) -> &'static str;

    /// Topic names to subscribe to on start.
    fn subscriptions(&self) -> Vec<String>;

    fn handle(&mut self, event: Self::Event) -> Result<(), Self::Error>;
}
