use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::definition::{Attrs, EventError};

/// How a base slot participates in a concrete event type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Not declared: the attribute is rejected and the slot stays empty.
    Absent,
    /// Declared, may be null.
    Optional,
    /// Declared, must be present and non-null.
    Required,
}

/// Required-ness of the base slots an event type may re-declare.
///
/// `aggregate_id` and `actor_id` are always required and are not listed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BaseSlots {
    pub workspace_id: Slot,
    pub target_user_id: Slot,
}

impl BaseSlots {
    /// Workspace-scoped when a workspace is given, never user-targeted.
    pub const DEFAULT: Self = Self {
        workspace_id: Slot::Optional,
        target_user_id: Slot::Absent,
    };

    pub fn declares_target_user(&self) -> bool {
        self.target_user_id != Slot::Absent
    }

    /// Apply a declared field that reuses a base slot: required unless it has a
    /// default. Other names leave the slots untouched.
    pub fn declare_field(&mut self, field: &str, has_default: bool) {
        let rule = if has_default { Slot::Optional } else { Slot::Required };
        match field {
            "workspace_id" => self.workspace_id = rule,
            "target_user_id" => self.target_user_id = rule,
            _ => {}
        }
    }
}

impl Default for BaseSlots {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Base slots carried by every domain event.
///
/// Notes:
/// - `event_id` and `occurred_at` are filled at construction and cannot be supplied.
/// - `occurred_at` never goes backwards within a process.
/// - `metadata` is diagnostic only; it never influences routing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventMeta {
    event_id: Uuid,
    aggregate_id: String,
    actor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_user_id: Option<String>,
    occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

/// Attribute names the facility fills itself.
pub const RESERVED_FIELDS: [&str; 2] = ["event_id", "occurred_at"];

/// Every field name carried by [`EventMeta`].
pub const BASE_FIELDS: [&str; 7] = [
    "event_id",
    "aggregate_id",
    "actor_id",
    "workspace_id",
    "target_user_id",
    "occurred_at",
    "metadata",
];

impl EventMeta {
    /// Pull the base slots out of `attrs`, validating required-ness.
    ///
    /// Called by the code generated from [`domain_event!`](crate::domain_event);
    /// declared fields are taken afterwards from what remains.
    pub fn from_attrs(attrs: &mut Attrs, slots: BaseSlots) -> Result<Self, EventError> {
        for reserved in RESERVED_FIELDS {
            if attrs.contains(reserved) {
                return Err(EventError::ReservedField {
                    event_kind: attrs.event_kind(),
                    field: reserved.to_string(),
                });
            }
        }

        let aggregate_id = attrs.require::<String>("aggregate_id")?;
        let actor_id = attrs.require::<String>("actor_id")?;
        let workspace_id = attrs.slot::<String>("workspace_id", slots.workspace_id)?;
        let target_user_id = attrs.slot::<String>("target_user_id", slots.target_user_id)?;
        let metadata = attrs
            .take::<BTreeMap<String, Value>>("metadata")?
            .unwrap_or_default();

        Ok(Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            actor_id,
            workspace_id,
            target_user_id,
            occurred_at: next_occurred_at(),
            metadata,
        })
    }

    pub fn is_base_field(field: &str) -> bool {
        BASE_FIELDS.contains(&field)
    }

    /// Base fields a definition may give a default to.
    pub fn accepts_default(field: &str) -> bool {
        Self::is_base_field(field) && !RESERVED_FIELDS.contains(&field)
    }

    /// Read a base field into the type a definition declared for it.
    pub fn base_field<T: DeserializeOwned>(
        &self,
        event_kind: &'static str,
        field: &str,
    ) -> Result<T, EventError> {
        let value = match field {
            "event_id" => serde_json::to_value(self.event_id),
            "aggregate_id" => Ok(Value::from(self.aggregate_id.as_str())),
            "actor_id" => Ok(Value::from(self.actor_id.as_str())),
            "workspace_id" => Ok(self.workspace_id.as_deref().map_or(Value::Null, Value::from)),
            "target_user_id" => Ok(self.target_user_id.as_deref().map_or(Value::Null, Value::from)),
            "occurred_at" => serde_json::to_value(self.occurred_at),
            "metadata" => serde_json::to_value(&self.metadata),
            _ => Ok(Value::Null),
        };

        value
            .and_then(serde_json::from_value)
            .map_err(|e| EventError::InvalidField {
                event_kind,
                field: field.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn target_user_id(&self) -> Option<&str> {
        self.target_user_id.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }
}

fn next_occurred_at() -> DateTime<Utc> {
    static LAST_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

    let now = Utc::now().timestamp_micros();
    let previous = LAST_MICROS.fetch_max(now, Ordering::AcqRel);
    DateTime::from_timestamp_micros(previous.max(now)).unwrap_or_else(Utc::now)
}
