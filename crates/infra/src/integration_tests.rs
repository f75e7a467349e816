//! Integration tests for the full reactive pipeline.
//!
//! Tests: use case → ProductionBus → PubSub → SubscriberWorker → Subscriber
//!
//! Verifies:
//! - Events reach exactly the workers subscribed to one of their topics
//! - Cross-context reactions emit follow-up events on the same bus
//! - Legacy subscribers keep receiving bridged messages
//! - Handler errors and panics do not take the worker down

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use mosaic_chat::{post_message, PostMessage};
use mosaic_events::{topic, DomainEvent, EventBus, EventDefinition, Inbox, Subscriber};
use mosaic_notifications::{InvitationNotifier, MentionNotifier, NotificationCreated};
use mosaic_projects::{create_project, CreateProject, ProjectCreated};
use mosaic_workspaces::{invite_member, InviteMember, Role};

use crate::catalog::AnyEvent;
use crate::config::{BusConfig, WorkerConfig};
use crate::event_bus::EventSystem;
use crate::legacy_bridge::LegacyTopicStatus;
use crate::workers::WorkerHandle;

/// Collects every event it is handed.
struct Recorder<T> {
    topics: Vec<String>,
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Subscriber<AnyEvent> for Recorder<T>
where
    T: TryFrom<AnyEvent> + Send + 'static,
{
    type Event = T;
    type Error = Infallible;

    fn name(&self) -> &'static str {
        "recorder"
    }

    fn subscriptions(&self) -> Vec<String> {
        self.topics.clone()
    }

    fn handle(&mut self, event: T) -> Result<(), Infallible> {
        self.seen.lock().unwrap().push(event);
        Ok(())
    }
}

fn worker_config(name: &str) -> WorkerConfig {
    mosaic_observability::init_for_tests();
    WorkerConfig::default()
        .with_name(name)
        .with_tick(Duration::from_millis(10))
}

fn record<T>(system: &EventSystem, topics: &[String]) -> (WorkerHandle, Arc<Mutex<Vec<T>>>)
where
    T: TryFrom<AnyEvent> + Send + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let topics = topics.to_vec();
    let worker_seen = seen.clone();
    let handle = system
        .spawn_worker(worker_config("recorder"), move || {
            Ok(Recorder {
                topics: topics.clone(),
                seen: worker_seen.clone(),
            })
        })
        .unwrap();
    (handle, seen)
}

/// Poll until `cond` holds or two seconds pass.
fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

/// Restarted workers re-subscribe from their own thread; wait until the registry shows it.
fn wait_for_subscribers(system: &EventSystem, topic: &str, count: usize) {
    let subscribed = wait_until(|| system.pubsub().subscriber_count(topic).unwrap() >= count);
    assert!(subscribed, "no subscriber showed up on {topic}");
}

/// Helper: give workers a moment to drain their inboxes.
fn wait_for_processing() {
    thread::sleep(Duration::from_millis(50));
}

fn create_demo_project(system: &EventSystem) -> ProjectCreated {
    create_project(
        system.bus(),
        CreateProject {
            workspace_id: "w1".into(),
            actor_id: "u1".into(),
            project_id: Some("p1".into()),
            name: "Demo".into(),
            description: None,
        },
    )
    .unwrap()
}

#[test]
fn project_created_reaches_workspace_subscriber_only() {
    let system = EventSystem::default();
    let (workspace_worker, workspace_seen) =
        record::<ProjectCreated>(&system, &[topic::workspace("w1")]);
    let (task_worker, task_seen) =
        record::<AnyEvent>(&system, &[topic::aggregate("projects", "task")]);

    let emitted = create_demo_project(&system);
    assert_eq!(emitted.slug(), "demo");

    assert!(wait_until(|| workspace_seen.lock().unwrap().len() == 1));
    wait_for_processing();

    let seen = workspace_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].name(), "Demo");
    assert_eq!(seen[0].event_id(), emitted.event_id());
    assert!(task_seen.lock().unwrap().is_empty());
    drop(seen);

    workspace_worker.shutdown();
    task_worker.shutdown();
}

#[test]
fn worker_ignores_other_event_types_on_shared_topics() {
    let system = EventSystem::default();
    let (worker, seen) = record::<NotificationCreated>(&system, &[topic::workspace("w1")]);

    create_demo_project(&system);
    assert!(wait_until(|| worker.stats().ignored == 1));

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(worker.stats().handled, 0);
    worker.shutdown();
}

#[test]
fn invitation_produces_a_notification_for_the_invitee() {
    let system = EventSystem::default();
    let bus = system.bus().clone();
    let notifier = system
        .spawn_worker(worker_config("invitations"), move || {
            Ok(InvitationNotifier::new(bus.clone()))
        })
        .unwrap();
    let (inbox_worker, notifications) = record::<NotificationCreated>(&system, &[topic::user("u2")]);

    invite_member(
        system.bus(),
        InviteMember {
            workspace_id: "w1".into(),
            inviter_id: "u1".into(),
            invitee_id: "u2".into(),
            invitee_email: "u2@example.com".into(),
            role: Role::Member,
        },
    )
    .unwrap();

    assert!(wait_until(|| notifications.lock().unwrap().len() == 1));
    let notifications = notifications.lock().unwrap();
    assert_eq!(notifications[0].notification_type(), "workspace_invitation");
    assert_eq!(notifications[0].target_user_id(), Some("u2"));
    assert_eq!(notifications[0].actor_id(), "u1");
    drop(notifications);

    // The invitation itself also lands on the user topic and is skipped there.
    assert!(wait_until(|| inbox_worker.stats().ignored == 1));

    notifier.shutdown();
    inbox_worker.shutdown();
}

#[test]
fn mentions_notify_everyone_but_the_author() {
    let system = EventSystem::default();
    let bus = system.bus().clone();
    let notifier = system
        .spawn_worker(worker_config("mentions"), move || Ok(MentionNotifier::new(bus.clone())))
        .unwrap();
    let (worker, seen) = record::<NotificationCreated>(
        &system,
        &[topic::aggregate("notifications", "notification")],
    );

    post_message(
        system.bus(),
        PostMessage {
            workspace_id: Some("w1".into()),
            conversation_id: "c1".into(),
            author_id: "u1".into(),
            body: "hey @u2 and @u3, cc @u1".into(),
        },
    )
    .unwrap();

    assert!(wait_until(|| seen.lock().unwrap().len() == 2));
    wait_for_processing();
    let recipients: Vec<String> = seen
        .lock()
        .unwrap()
        .iter()
        .filter_map(|n| n.target_user_id().map(str::to_string))
        .collect();
    assert_eq!(recipients, vec!["u2", "u3"]);

    notifier.shutdown();
    worker.shutdown();
}

#[test]
fn legacy_subscriber_receives_bridged_message() {
    let system = EventSystem::default();
    let legacy = Inbox::new();
    system.pubsub().subscribe("workspace:w1", &legacy).unwrap();

    assert_eq!(
        system.legacy_audit().unwrap(),
        vec![LegacyTopicStatus {
            topic: "workspace:w1".into(),
            subscribers: 1
        }]
    );

    create_demo_project(&system);

    let message = legacy.recv_timeout(Duration::from_secs(1)).unwrap();
    let message = message.as_legacy().unwrap();
    assert_eq!(message.tag(), "project_added");
    assert_eq!(message.get("id"), Some(&serde_json::json!("p1")));
    assert!(legacy.try_recv().is_err());
}

#[test]
fn legacy_bridge_switched_off_keeps_legacy_topics_silent() {
    let system = EventSystem::new(&BusConfig::default().with_legacy_bridge(false));
    let legacy = Inbox::new();
    system.pubsub().subscribe("workspace:w1", &legacy).unwrap();

    create_demo_project(&system);

    assert!(legacy.recv_timeout(Duration::from_millis(50)).is_err());
}

/// Fails every other event.
struct Flaky {
    calls: usize,
}

impl Subscriber<AnyEvent> for Flaky {
    type Event = ProjectCreated;
    type Error = String;

    fn name(&self) -> &'static str {
        "flaky"
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![topic::context("projects")]
    }

    fn handle(&mut self, event: ProjectCreated) -> Result<(), String> {
        self.calls += 1;
        if self.calls % 2 == 1 {
            return Err(format!("rejected {}", event.project_id()));
        }
        Ok(())
    }
}

#[test]
fn handler_error_is_logged_and_processing_continues() {
    let system = EventSystem::default();
    let worker = system
        .spawn_worker(worker_config("flaky"), || Ok(Flaky { calls: 0 }))
        .unwrap();

    create_demo_project(&system);
    create_demo_project(&system);

    assert!(wait_until(|| {
        let stats = worker.stats();
        stats.failed == 1 && stats.handled == 1
    }));
    assert!(worker.is_running());
    worker.shutdown();
}

/// Panics on projects named "boom".
struct Fragile {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Subscriber<AnyEvent> for Fragile {
    type Event = ProjectCreated;
    type Error = Infallible;

    fn name(&self) -> &'static str {
        "fragile"
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![topic::aggregate_of::<ProjectCreated>()]
    }

    fn handle(&mut self, event: ProjectCreated) -> Result<(), Infallible> {
        if event.name() == "boom" {
            panic!("cannot handle {}", event.project_id());
        }
        self.seen.lock().unwrap().push(event.name().clone());
        Ok(())
    }
}

fn create_named(system: &EventSystem, name: &str) {
    create_project(
        system.bus(),
        CreateProject {
            workspace_id: "w1".into(),
            actor_id: "u1".into(),
            project_id: None,
            name: name.into(),
            description: None,
        },
    )
    .unwrap();
}

#[test]
fn panicking_handler_is_restarted_with_fresh_state() {
    let system = EventSystem::default();
    let builds = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let factory_builds = builds.clone();
    let factory_seen = seen.clone();
    let worker = system
        .spawn_worker(worker_config("fragile").with_max_restarts(2), move || {
            factory_builds.fetch_add(1, Ordering::SeqCst);
            Ok(Fragile {
                seen: factory_seen.clone(),
            })
        })
        .unwrap();

    create_named(&system, "boom");
    assert!(wait_until(|| worker.stats().restarts == 1));
    wait_for_subscribers(&system, "events:projects:project", 1);

    create_named(&system, "Steady");
    assert!(wait_until(|| seen.lock().unwrap().len() == 1));

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(seen.lock().unwrap()[0], "Steady");
    assert!(worker.is_running());
    worker.shutdown();
}

#[test]
fn worker_gives_up_after_max_restarts() {
    let system = EventSystem::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let factory_seen = seen.clone();
    let worker = system
        .spawn_worker(worker_config("fragile").with_max_restarts(0), move || {
            Ok(Fragile {
                seen: factory_seen.clone(),
            })
        })
        .unwrap();

    create_named(&system, "boom");

    assert!(wait_until(|| !worker.is_running()));
    assert_eq!(system.pubsub().subscriber_count("events:projects:project").unwrap(), 0);
    worker.shutdown();
}

#[test]
fn panicking_factory_on_restart_marks_the_worker_stopped() {
    let system = EventSystem::default();
    let builds = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let factory_builds = builds.clone();
    let factory_seen = seen.clone();
    let worker = system
        .spawn_worker(worker_config("fragile").with_max_restarts(3), move || {
            if factory_builds.fetch_add(1, Ordering::SeqCst) > 0 {
                panic!("dependency went away");
            }
            Ok(Fragile {
                seen: factory_seen.clone(),
            })
        })
        .unwrap();

    create_named(&system, "boom");

    assert!(wait_until(|| !worker.is_running()));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(system.pubsub().subscriber_count("events:projects:project").unwrap(), 0);
    worker.shutdown();
}

#[test]
fn failing_factory_fails_spawn() {
    let system = EventSystem::default();
    let spawned = system.spawn_worker(worker_config("broken"), || -> anyhow::Result<Flaky> {
        Err(anyhow::anyhow!("missing dependency"))
    });

    let err = spawned.unwrap_err();
    assert!(format!("{err:#}").contains("missing dependency"));
    assert!(system.pubsub().topics().unwrap().is_empty());
}

#[test]
fn worker_is_subscribed_when_spawn_returns() {
    let system = EventSystem::default();
    let (worker, seen) = record::<ProjectCreated>(&system, &[topic::workspace("w1")]);

    assert_eq!(system.pubsub().subscriber_count("events:workspace:w1").unwrap(), 1);
    let ack = system.bus().emit(create_demo_project_event()).unwrap();
    assert!(ack.deliveries >= 1);

    assert!(wait_until(|| seen.lock().unwrap().len() == 1));
    worker.shutdown();
}

#[test]
fn shutdown_unsubscribes_the_worker() {
    let system = EventSystem::default();
    let (worker, _seen) = record::<ProjectCreated>(&system, &[topic::workspace("w1")]);

    worker.shutdown();

    assert_eq!(system.pubsub().subscriber_count("events:workspace:w1").unwrap(), 0);
    let ack = system.bus().emit(create_demo_project_event()).unwrap();
    assert_eq!(ack.deliveries, 0);
}

fn create_demo_project_event() -> ProjectCreated {
    ProjectCreated::construct(serde_json::json!({
        "aggregate_id": "p1", "actor_id": "u1", "workspace_id": "w1",
        "project_id": "p1", "name": "Demo", "slug": "demo",
    }))
    .unwrap()
}
