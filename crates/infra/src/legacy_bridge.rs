//! Legacy bridge: re-publishes typed events in the pre-migration message
//! convention so subscribers that were not migrated yet keep working.
//!
//! Legacy topics are `workspace:<id>`, `document:<id>`, `user:<id>` and
//! `conversation:<id>`. They never start with the typed `events:` prefix, so
//! the two conventions cannot collide on the same topic.
//!
//! A case is removed by hand once [`legacy_audit`] shows nobody listens on its
//! topics any more.

use mosaic_events::{topic, DomainEvent, LegacyMessage, LegacyTranslator, Message, PubSub, PubSubError};

use crate::catalog::AnyEvent;

pub fn workspace_topic(workspace_id: &str) -> String {
    format!("workspace:{workspace_id}")
}

pub fn document_topic(document_id: &str) -> String {
    format!("document:{document_id}")
}

pub fn user_topic(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub fn conversation_topic(conversation_id: &str) -> String {
    format!("conversation:{conversation_id}")
}

/// Translation table from [`AnyEvent`] to legacy `(topic, message)` pairs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyBridge;

impl LegacyBridge {
    /// Kinds that still have a legacy case.
    pub fn bridged_kinds() -> &'static [&'static str] {
        &[
            "projects.project_created",
            "projects.project_archived",
            "documents.document_created",
            "documents.document_updated",
            "workspaces.member_invited",
            "chat.message_posted",
            "notifications.notification_created",
        ]
    }
}

impl LegacyTranslator<AnyEvent> for LegacyBridge {
    fn translate(&self, event: &AnyEvent) -> Vec<(String, LegacyMessage)> {
        match event {
            AnyEvent::ProjectCreated(e) => on_workspace(
                e.workspace_id(),
                LegacyMessage::new("project_added").with("id", e.project_id().as_str()),
            ),
            AnyEvent::ProjectArchived(e) => on_workspace(
                e.workspace_id(),
                LegacyMessage::new("project_removed").with("id", e.project_id().as_str()),
            ),
            AnyEvent::DocumentCreated(e) => on_workspace(
                e.workspace_id(),
                LegacyMessage::new("document_created")
                    .with("id", e.document_id().as_str())
                    .with("title", e.title().as_str()),
            ),
            AnyEvent::DocumentUpdated(e) => vec![(
                document_topic(e.document_id()),
                LegacyMessage::new("document_updated")
                    .with("id", e.document_id().as_str())
                    .with("title", e.title().as_str()),
            )],
            AnyEvent::MemberInvited(e) => match (e.target_user_id(), e.workspace_id()) {
                (Some(invitee), Some(workspace_id)) => vec![(
                    user_topic(invitee),
                    LegacyMessage::new("workspace_invitation")
                        .with("workspace_id", workspace_id)
                        .with("invited_by", e.actor_id()),
                )],
                _ => Vec::new(),
            },
            AnyEvent::MessagePosted(e) => vec![(
                conversation_topic(e.conversation_id()),
                LegacyMessage::new("new_message")
                    .with("id", e.message_id().as_str())
                    .with("author_id", e.actor_id())
                    .with("body", e.body().as_str()),
            )],
            AnyEvent::NotificationCreated(e) => match e.target_user_id() {
                Some(recipient) => vec![(
                    user_topic(recipient),
                    LegacyMessage::new("notification")
                        .with("id", e.notification_id().as_str())
                        .with("kind", e.notification_type().as_str()),
                )],
                None => Vec::new(),
            },
            AnyEvent::WorkspaceCreated(_)
            | AnyEvent::MemberJoined(_)
            | AnyEvent::TaskAdded(_)
            | AnyEvent::DocumentDeleted(_)
            | AnyEvent::NotificationRead(_) => Vec::new(),
        }
    }
}

fn on_workspace(workspace_id: Option<&str>, message: LegacyMessage) -> Vec<(String, LegacyMessage)> {
    match workspace_id {
        Some(id) => vec![(workspace_topic(id), message)],
        None => Vec::new(),
    }
}

/// Subscriber count for one live legacy topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTopicStatus {
    pub topic: String,
    pub subscribers: usize,
}

/// Legacy topics that still have at least one live subscription, sorted by
/// topic. An empty report means the bridge can be switched off.
pub fn legacy_audit<E>(pubsub: &PubSub<Message<E>>) -> Result<Vec<LegacyTopicStatus>, PubSubError> {
    let typed_prefix = format!("{}:", topic::PREFIX);
    let mut report = Vec::new();
    for name in pubsub.topics()? {
        if name.starts_with(&typed_prefix) {
            continue;
        }
        let subscribers = pubsub.subscriber_count(&name)?;
        if subscribers > 0 {
            report.push(LegacyTopicStatus {
                topic: name,
                subscribers,
            });
        }
    }
    Ok(report)
}
