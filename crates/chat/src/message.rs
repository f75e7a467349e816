use serde::{Deserialize, Serialize};
use serde_json::json;

use mosaic_core::{ensure_id, new_id, DomainError, DomainResult};
use mosaic_events::{emit_event, EventBus, EventDefinition};

use crate::events::MessagePosted;

pub const MAX_BODY_LEN: usize = 4_000;

/// Command: PostMessage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMessage {
    pub workspace_id: Option<String>,
    pub conversation_id: String,
    pub author_id: String,
    pub body: String,
}

/// `@user` tokens in order of first appearance, without duplicates.
fn extract_mentions(body: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    for word in body.split_whitespace() {
        let Some(handle) = word.strip_prefix('@') else {
            continue;
        };
        let handle = handle.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_');
        if !handle.is_empty() && !mentions.iter().any(|m| m == handle) {
            mentions.push(handle.to_string());
        }
    }
    mentions
}

pub fn post_message<B>(bus: &B, cmd: PostMessage) -> DomainResult<MessagePosted>
where
    B: EventBus,
    MessagePosted: Into<B::Event>,
{
    ensure_id("conversation_id", &cmd.conversation_id)?;
    ensure_id("author_id", &cmd.author_id)?;
    let body = cmd.body.trim();
    if body.is_empty() {
        return Err(DomainError::validation("message body cannot be empty"));
    }
    if body.chars().count() > MAX_BODY_LEN {
        return Err(DomainError::validation(format!(
            "message body exceeds {MAX_BODY_LEN} characters"
        )));
    }

    let message_id = new_id();
    let event = MessagePosted::construct(json!({
        "aggregate_id": message_id,
        "actor_id": cmd.author_id,
        "workspace_id": cmd.workspace_id,
        "conversation_id": cmd.conversation_id,
        "message_id": message_id,
        "body": body,
        "mentions": extract_mentions(body),
    }))?;

    emit_event(bus, event)
}
