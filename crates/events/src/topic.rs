//! Topic Resolver.
//!
//! Topic names are matched on by external tooling and must stay bit-exact:
//!
//! ```text
//! events:<context>
//! events:<context>:<aggregate_category>
//! events:workspace:<workspace_id>
//! events:user:<target_user_id>
//! ```

use std::collections::BTreeSet;

use crate::definition::EventDefinition;
use crate::event::DomainEvent;

pub const PREFIX: &str = "events";

/// `events:<context>`
pub fn context(context: &str) -> String {
    format!("{PREFIX}:{context}")
}

/// `events:<context>:<aggregate_category>`
pub fn aggregate(context: &str, aggregate_category: &str) -> String {
    format!("{PREFIX}:{context}:{aggregate_category}")
}

/// `events:workspace:<workspace_id>`
pub fn workspace(workspace_id: &str) -> String {
    format!("{PREFIX}:workspace:{workspace_id}")
}

/// `events:user:<user_id>`
pub fn user(user_id: &str) -> String {
    format!("{PREFIX}:user:{user_id}")
}

/// Context topic every event of type `T` is published on.
pub fn context_of<T: EventDefinition>() -> String {
    context(context_segment(T::event_kind()))
}

/// Aggregate topic every event of type `T` is published on.
pub fn aggregate_of<T: EventDefinition>() -> String {
    aggregate(context_segment(T::event_kind()), T::aggregate_category())
}

fn context_segment(kind: &str) -> &str {
    kind.split_once('.').map_or(kind, |(context, _)| context)
}

/// Every topic `event` must be delivered on. Pure and total.
pub fn resolve<E: DomainEvent>(event: &E) -> BTreeSet<String> {
    let ctx = event.context();

    let mut topics = BTreeSet::new();
    topics.insert(context(ctx));
    topics.insert(aggregate(ctx, event.category()));

    if let Some(workspace_id) = event.workspace_id() {
        topics.insert(workspace(workspace_id));
    }
    if let Some(user_id) = event.target_user_id() {
        topics.insert(user(user_id));
    }

    topics
}
