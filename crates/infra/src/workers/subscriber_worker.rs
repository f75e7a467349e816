use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use mosaic_events::{Inbox, Message, PubSub, Subscriber};

use crate::config::WorkerConfig;

/// Counters for one worker, across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Events the subscriber handled successfully
    pub handled: u64,
    /// Events whose handler returned an error
    pub failed: u64,
    /// Messages that did not convert into the subscriber's event type
    pub ignored: u64,
    /// Times the subscriber was rebuilt after a panic
    pub restarts: u32,
    pub running: bool,
}

/// Handle to control and join a background worker.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also stops
/// the worker, but does not wait for it.
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> WorkerStats {
        lock(&self.stats).clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.stats).running
    }
}

/// Supervised reactive worker.
///
/// - On start: builds the subscriber from the factory and subscribes a fresh
///   inbox to every topic it lists before `spawn` returns
/// - Typed events that convert into `S::Event` go to `handle`; everything else
///   (other event types, legacy messages) is skipped
/// - Handler errors are logged and processing continues
/// - A panicking handler tears the subscription down; the worker is rebuilt
///   from the factory and re-subscribed up to `max_restarts` times
#[derive(Debug)]
pub struct SubscriberWorker;

enum Exit {
    Shutdown,
    Disconnected,
}

/// Marks the worker stopped however its thread ends, unwinding included.
struct RunningGuard<'a>(&'a Mutex<WorkerStats>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).running = false;
    }
}

impl SubscriberWorker {
    /// Fails when the first subscriber cannot be built or subscribed, or the
    /// thread cannot be spawned.
    pub fn spawn<E, S, F>(
        pubsub: Arc<PubSub<Message<E>>>,
        config: WorkerConfig,
        mut factory: F,
    ) -> anyhow::Result<WorkerHandle>
    where
        E: Clone + Send + Sync + 'static,
        S: Subscriber<E>,
        F: FnMut() -> anyhow::Result<S> + Send + 'static,
    {
        let first = start(&pubsub, &config.name, &mut factory)
            .with_context(|| format!("starting worker {}", config.name))?;

        let first_inbox = first.1.id();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(WorkerStats {
            running: true,
            ..WorkerStats::default()
        }));

        let thread_stats = stats.clone();
        let thread_config = config.clone();
        let thread_pubsub = pubsub.clone();
        let spawned = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || {
                let _running = RunningGuard(&thread_stats);
                supervise(
                    thread_pubsub,
                    thread_config,
                    factory,
                    first,
                    shutdown_rx,
                    &thread_stats,
                );
            });

        let join = match spawned {
            Ok(join) => join,
            Err(err) => {
                let _ = pubsub.unsubscribe_all(first_inbox);
                return Err(anyhow::Error::new(err).context(format!("spawning worker {}", config.name)));
            }
        };

        Ok(WorkerHandle {
            name: config.name,
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

/// Build a subscriber and subscribe a fresh inbox to its topics.
fn start<E, S, F>(
    pubsub: &PubSub<Message<E>>,
    worker: &str,
    factory: &mut F,
) -> anyhow::Result<(S, Inbox<Message<E>>)>
where
    S: Subscriber<E>,
    F: FnMut() -> anyhow::Result<S>,
{
    let subscriber = factory()?;
    let inbox = Inbox::new();
    let topics = subscriber.subscriptions();

    for topic in &topics {
        if let Err(err) = pubsub.subscribe(topic.clone(), &inbox) {
            let _ = pubsub.unsubscribe_all(inbox.id());
            return Err(anyhow::Error::new(err).context(format!("subscribing to {topic}")));
        }
    }

    info!(worker, subscriber = subscriber.name(), topics = ?topics, "worker subscribed");
    Ok((subscriber, inbox))
}

fn supervise<E, S, F>(
    pubsub: Arc<PubSub<Message<E>>>,
    config: WorkerConfig,
    mut factory: F,
    first: (S, Inbox<Message<E>>),
    shutdown_rx: mpsc::Receiver<()>,
    stats: &Mutex<WorkerStats>,
) where
    E: Clone,
    S: Subscriber<E>,
    F: FnMut() -> anyhow::Result<S>,
{
    let worker = config.name.as_str();
    let mut restarts = 0u32;
    let mut next = Some(first);

    loop {
        let (mut subscriber, inbox) = match next.take() {
            Some(started) => started,
            None => match start(&pubsub, worker, &mut factory) {
                Ok(started) => started,
                Err(err) => {
                    error!(worker, error = %err, "failed to restart subscriber");
                    return;
                }
            },
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatch(worker, &mut subscriber, &inbox, &shutdown_rx, &config, stats)
        }));

        if let Err(err) = pubsub.unsubscribe_all(inbox.id()) {
            warn!(worker, error = %err, "unsubscribe failed");
        }

        match outcome {
            Ok(Exit::Shutdown) => {
                debug!(worker, "worker stopped");
                return;
            }
            Ok(Exit::Disconnected) => {
                warn!(worker, "inbox disconnected");
                return;
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                if restarts >= config.max_restarts {
                    error!(worker, restarts, panic = %reason, "subscriber panicked, giving up");
                    return;
                }
                restarts += 1;
                lock(stats).restarts = restarts;
                warn!(worker, restarts, panic = %reason, "subscriber panicked, restarting");
            }
        }
    }
}

fn dispatch<E, S>(
    worker: &str,
    subscriber: &mut S,
    inbox: &Inbox<Message<E>>,
    shutdown_rx: &mpsc::Receiver<()>,
    config: &WorkerConfig,
    stats: &Mutex<WorkerStats>,
) -> Exit
where
    E: Clone,
    S: Subscriber<E>,
{
    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return Exit::Shutdown,
            Err(TryRecvError::Empty) => {}
        }

        let event = match inbox.recv_timeout(config.tick) {
            Ok(Message::Event(event)) => event,
            Ok(Message::Legacy(_)) => {
                lock(stats).ignored += 1;
                continue;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Exit::Disconnected,
        };

        let Ok(event) = <S::Event as TryFrom<E>>::try_from((*event).clone()) else {
            lock(stats).ignored += 1;
            continue;
        };

        match subscriber.handle(event) {
            Ok(()) => lock(stats).handled += 1,
            Err(err) => {
                lock(stats).failed += 1;
                warn!(worker, error = ?err, "subscriber handler failed");
            }
        }
    }
}

fn lock(stats: &Mutex<WorkerStats>) -> MutexGuard<'_, WorkerStats> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
