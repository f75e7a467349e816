use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::EventMeta;

/// Instance view of a domain event.
///
/// Events are:
/// - **immutable** (treat them as facts; "updating" means emitting a new event)
/// - **self-routing** (topics are derived from the fields exposed here)
///
/// Concrete event structs get this impl from [`domain_event!`](crate::domain_event);
/// sum types get a delegating impl from [`event_union!`](crate::event_union).
pub trait DomainEvent: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable kind identifier (e.g. `"projects.project_created"`).
    fn kind(&self) -> &'static str;

    /// Aggregate category the event concerns (e.g. `"project"`).
    fn category(&self) -> &'static str;

    /// Base slots shared by every event.
    fn meta(&self) -> &EventMeta;

    /// Whether the concrete type declares per-user delivery.
    fn targets_user(&self) -> bool;

    /// Bounded context, i.e. the first segment of [`kind`](Self::kind).
    fn context(&self) -> &'static str {
        let kind = self.kind();
        kind.split_once('.').map_or(kind, |(context, _)| context)
    }

    fn event_id(&self) -> Uuid {
        self.meta().event_id()
    }

    fn aggregate_id(&self) -> &str {
        self.meta().aggregate_id()
    }

    fn actor_id(&self) -> &str {
        self.meta().actor_id()
    }

    fn workspace_id(&self) -> Option<&str> {
        self.meta().workspace_id()
    }

    /// Per-user delivery target; always `None` for types that do not declare one.
    fn target_user_id(&self) -> Option<&str> {
        if self.targets_user() {
            self.meta().target_user_id()
        } else {
            None
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.meta().occurred_at()
    }

    fn metadata(&self) -> &BTreeMap<String, Value> {
        self.meta().metadata()
    }
}
