//! Cross-context reactions, run as reactive workers by the host runtime.
//!
//! Each reaction turns another context's event into notifications emitted on
//! the injected bus. They listen on aggregate topics, so they never see
//! their own notification events.

use tracing::debug;

use mosaic_chat::MessagePosted;
use mosaic_core::DomainError;
use mosaic_events::{topic, DomainEvent, EventBus, Subscriber};
use mosaic_workspaces::MemberInvited;

use crate::events::NotificationCreated;
use crate::notification::{notify_user, Notify};

/// Tells invitees they were invited.
#[derive(Debug, Clone)]
pub struct InvitationNotifier<B> {
    bus: B,
}

impl<B> InvitationNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<E, B> Subscriber<E> for InvitationNotifier<B>
where
    MemberInvited: TryFrom<E>,
    B: EventBus + 'static,
    NotificationCreated: Into<B::Event>,
{
    type Event = MemberInvited;
    type Error = DomainError;

    fn name(&self) -> &'static str {
        "invitation-notifier"
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![topic::aggregate_of::<MemberInvited>()]
    }

    fn handle(&mut self, event: MemberInvited) -> Result<(), DomainError> {
        let Some(invitee) = event.target_user_id() else {
            return Err(DomainError::invariant("invitation without invitee"));
        };
        let workspace_id = invitation_workspace(&event)?;

        let created = notify_user(
            &self.bus,
            Notify {
                recipient_id: invitee.to_string(),
                actor_id: event.actor_id().to_string(),
                workspace_id: Some(workspace_id.to_string()),
                notification_type: "workspace_invitation".into(),
                title: format!("You were invited to join as {}", event.role()),
                link: Some(format!("/workspaces/{workspace_id}")),
            },
        )?;

        debug!(
            invitation = %event.event_id(),
            notification = %created.notification_id(),
            "invitation notification created"
        );
        Ok(())
    }
}

fn invitation_workspace(event: &impl DomainEvent) -> Result<&str, DomainError> {
    event
        .workspace_id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DomainError::invariant("invitation without workspace"))
}

/// Notifies every user mentioned in a chat message, except the author.
#[derive(Debug, Clone)]
pub struct MentionNotifier<B> {
    bus: B,
}

impl<B> MentionNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<E, B> Subscriber<E> for MentionNotifier<B>
where
    MessagePosted: TryFrom<E>,
    B: EventBus + 'static,
    NotificationCreated: Into<B::Event>,
{
    type Event = MessagePosted;
    type Error = DomainError;

    fn name(&self) -> &'static str {
        "mention-notifier"
    }

    fn subscriptions(&self) -> Vec<String> {
        vec![topic::aggregate_of::<MessagePosted>()]
    }

    fn handle(&mut self, event: MessagePosted) -> Result<(), DomainError> {
        let author = event.actor_id();

        for mentioned in event.mentions().iter().filter(|m| m.as_str() != author) {
            notify_user(
                &self.bus,
                Notify {
                    recipient_id: mentioned.clone(),
                    actor_id: author.to_string(),
                    workspace_id: event.workspace_id().map(str::to_string),
                    notification_type: "mention".into(),
                    title: "You were mentioned in a conversation".into(),
                    link: Some(format!("/conversations/{}", event.conversation_id())),
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mosaic_chat::{post_message, PostMessage};
    use mosaic_events::TestBus;
    use mosaic_workspaces::{invite_member, InviteMember, Role};

    use crate::events::NotificationsEvent;

    fn invited() -> MemberInvited {
        invite_member(
            &TestBus::<MemberInvited>::new(),
            InviteMember {
                workspace_id: "w1".into(),
                inviter_id: "u1".into(),
                invitee_id: "u2".into(),
                invitee_email: "u2@example.com".into(),
                role: Role::Member,
            },
        )
        .unwrap()
    }

    #[test]
    fn invitation_becomes_a_notification_for_the_invitee() {
        let bus = Arc::new(TestBus::<NotificationsEvent>::new());
        let mut notifier = InvitationNotifier::new(bus.clone());

        Subscriber::<MemberInvited>::handle(&mut notifier, invited()).unwrap();

        let events = bus.events();
        assert_eq!(events.len(), 1);
        let NotificationsEvent::NotificationCreated(created) = &events[0] else {
            panic!("expected a notification, got {:?}", events[0]);
        };
        assert_eq!(created.target_user_id(), Some("u2"));
        assert_eq!(created.actor_id(), "u1");
        assert_eq!(created.notification_type(), "workspace_invitation");
        assert_eq!(created.link().as_deref(), Some("/workspaces/w1"));
    }

    #[test]
    fn invitation_workspace_is_taken_from_the_event() {
        assert_eq!(invitation_workspace(&invited()).unwrap(), "w1");
    }

    #[test]
    fn event_without_workspace_is_rejected_as_invitation() {
        let posted = post_message(
            &TestBus::<MessagePosted>::new(),
            PostMessage {
                workspace_id: None,
                conversation_id: "c1".into(),
                author_id: "u1".into(),
                body: "direct message".into(),
            },
        )
        .unwrap();

        let err = invitation_workspace(&posted).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn invitation_notifier_listens_on_membership_topic() {
        let notifier = InvitationNotifier::new(Arc::new(TestBus::<NotificationsEvent>::new()));

        assert_eq!(
            Subscriber::<MemberInvited>::subscriptions(&notifier),
            vec!["events:workspaces:membership".to_string()]
        );
    }

    #[test]
    fn mentions_skip_the_author() {
        let posted = post_message(
            &TestBus::<MessagePosted>::new(),
            PostMessage {
                workspace_id: Some("w1".into()),
                conversation_id: "c1".into(),
                author_id: "u1".into(),
                body: "@u1 @u2 @u3 standup?".into(),
            },
        )
        .unwrap();

        let bus = Arc::new(TestBus::<NotificationsEvent>::new());
        let mut notifier = MentionNotifier::new(bus.clone());
        Subscriber::<MessagePosted>::handle(&mut notifier, posted).unwrap();

        let recipients: Vec<String> = bus
            .events()
            .iter()
            .filter_map(|e| e.target_user_id().map(str::to_string))
            .collect();
        assert_eq!(recipients, vec!["u2", "u3"]);
    }
}
