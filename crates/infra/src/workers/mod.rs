//! Background workers hosting [`Subscriber`](mosaic_events::Subscriber) implementations.

pub mod subscriber_worker;

pub use subscriber_worker::{SubscriberWorker, WorkerHandle, WorkerStats};
