//! Deterministic bus for use-case tests.
//!
//! - No topic resolution, no dispatch, no legacy translation
//! - Synchronous: the event is recorded before `emit` returns
//! - Append-only until [`TestBus::reset`]

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::bus::{Ack, EmitOptions, EventBus};
use crate::event::DomainEvent;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TestBusError {
    #[error("test bus lock poisoned")]
    Poisoned,
}

/// Records every emitted event, in emission order.
#[derive(Debug)]
pub struct TestBus<E> {
    events: Mutex<Vec<E>>,
}

impl<E> TestBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<E>> {
        // A panicking test thread must not hide what was recorded before it.
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.recorded().clear();
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded().is_empty()
    }
}

impl<E: Clone> TestBus<E> {
    /// Every event emitted since creation or the last reset, oldest first.
    pub fn events(&self) -> Vec<E> {
        self.recorded().clone()
    }

    pub fn last(&self) -> Option<E> {
        self.recorded().last().cloned()
    }
}

impl<E> Default for TestBus<E> {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl<E: DomainEvent> EventBus for TestBus<E> {
    type Event = E;
    type Error = TestBusError;

    fn emit_with(&self, event: E, _options: &EmitOptions) -> Result<Ack, TestBusError> {
        let event_id = event.event_id();
        self.events
            .lock()
            .map_err(|_| TestBusError::Poisoned)?
            .push(event);

        Ok(Ack {
            event_id,
            topics: Vec::new(),
            deliveries: 0,
            legacy_messages: 0,
        })
    }
}
