use serde::{Deserialize, Serialize};
use serde_json::json;

use mosaic_core::{ensure_id, new_id, DomainError, DomainResult};
use mosaic_events::{emit_event, EventBus, EventDefinition};

use crate::events::{NotificationCreated, NotificationRead};

/// Command: Notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notify {
    pub recipient_id: String,
    pub actor_id: String,
    pub workspace_id: Option<String>,
    pub notification_type: String,
    pub title: String,
    pub link: Option<String>,
}

/// Command: MarkRead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRead {
    pub recipient_id: String,
    pub notification_id: String,
}

pub fn notify_user<B>(bus: &B, cmd: Notify) -> DomainResult<NotificationCreated>
where
    B: EventBus,
    NotificationCreated: Into<B::Event>,
{
    ensure_id("recipient_id", &cmd.recipient_id)?;
    if cmd.notification_type.trim().is_empty() {
        return Err(DomainError::validation("notification_type cannot be empty"));
    }
    if cmd.title.trim().is_empty() {
        return Err(DomainError::validation("notification title cannot be empty"));
    }

    let notification_id = new_id();
    let event = NotificationCreated::construct(json!({
        "aggregate_id": notification_id,
        "actor_id": cmd.actor_id,
        "workspace_id": cmd.workspace_id,
        "target_user_id": cmd.recipient_id,
        "notification_id": notification_id,
        "notification_type": cmd.notification_type,
        "title": cmd.title.trim(),
        "link": cmd.link,
    }))?;

    emit_event(bus, event)
}

/// The recipient is also the actor: only they can read their notifications.
pub fn mark_read<B>(bus: &B, cmd: MarkRead) -> DomainResult<NotificationRead>
where
    B: EventBus,
    NotificationRead: Into<B::Event>,
{
    ensure_id("recipient_id", &cmd.recipient_id)?;
    ensure_id("notification_id", &cmd.notification_id)?;

    let event = NotificationRead::construct(json!({
        "aggregate_id": cmd.notification_id,
        "actor_id": cmd.recipient_id,
        "target_user_id": cmd.recipient_id,
        "notification_id": cmd.notification_id,
    }))?;

    emit_event(bus, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_events::{topic, DomainEvent, TestBus};

    use crate::events::NotificationsEvent;

    fn notify(workspace_id: Option<&str>) -> Notify {
        Notify {
            recipient_id: "u2".into(),
            actor_id: "u1".into(),
            workspace_id: workspace_id.map(str::to_string),
            notification_type: "mention".into(),
            title: "You were mentioned".into(),
            link: None,
        }
    }

    #[test]
    fn global_notification_routes_to_user_only() {
        let bus = TestBus::<NotificationsEvent>::new();
        let created = notify_user(&bus, notify(None)).unwrap();

        let topics = topic::resolve(&created);
        assert!(topics.contains(&topic::user("u2")));
        assert!(!topics.iter().any(|t| t.starts_with("events:workspace:")));
        assert_eq!(created.target_user_id(), Some("u2"));
    }

    #[test]
    fn workspace_notification_routes_to_both() {
        let bus = TestBus::<NotificationsEvent>::new();
        let created = notify_user(&bus, notify(Some("w1"))).unwrap();

        let topics = topic::resolve(&created);
        assert!(topics.contains(&topic::workspace("w1")));
        assert!(topics.contains(&topic::user("u2")));
        assert_eq!(topics.len(), 4);
    }

    #[test]
    fn read_receipt_is_authored_by_the_recipient() {
        let bus = TestBus::<NotificationsEvent>::new();
        let read = mark_read(
            &bus,
            MarkRead {
                recipient_id: "u2".into(),
                notification_id: "n1".into(),
            },
        )
        .unwrap();

        assert_eq!(read.actor_id(), "u2");
        assert_eq!(read.aggregate_id(), "n1");
        assert_eq!(bus.events(), vec![NotificationsEvent::NotificationRead(read)]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let bus = TestBus::<NotificationsEvent>::new();
        let mut cmd = notify(None);
        cmd.title = " ".into();

        assert!(notify_user(&bus, cmd).is_err());
        assert!(bus.is_empty());
    }
}
