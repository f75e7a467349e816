//! Event Definition Facility.
//!
//! [`domain_event!`](crate::domain_event) turns a declarative field list into an
//! immutable event struct with a validating constructor, a derived kind string
//! and a fixed aggregate category. [`event_union!`](crate::event_union) builds
//! the sum types used for dispatch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use mosaic_core::DomainError;

use crate::envelope::{BaseSlots, Slot};
use crate::event::DomainEvent;

/// Event construction failure. Raised at the call site, before anything is published.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("{event_kind}: missing required field `{field}`")]
    MissingRequiredField {
        event_kind: &'static str,
        field: String,
    },

    #[error("{event_kind}: unknown field `{field}`")]
    UnknownField {
        event_kind: &'static str,
        field: String,
    },

    #[error("{event_kind}: field `{field}` is filled automatically")]
    ReservedField {
        event_kind: &'static str,
        field: String,
    },

    #[error("{event_kind}: invalid value for `{field}`: {reason}")]
    InvalidField {
        event_kind: &'static str,
        field: String,
        reason: String,
    },

    #[error("{event_kind}: attributes must be a JSON object")]
    InvalidAttributes { event_kind: &'static str },

    #[error("no event type is registered for kind `{kind}`")]
    UnknownKind { kind: String },
}

impl EventError {
    /// Name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field, .. }
            | Self::UnknownField { field, .. }
            | Self::ReservedField { field, .. }
            | Self::InvalidField { field, .. } => Some(field),
            Self::InvalidAttributes { .. } | Self::UnknownKind { .. } => None,
        }
    }
}

impl From<EventError> for DomainError {
    fn from(err: EventError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Static side of an event type: how it is built and what it is called.
pub trait EventDefinition: DomainEvent + Sized {
    /// `Context::EventName`, the input to kind derivation.
    const QUALIFIED_NAME: &'static str;

    /// Derived once from [`QUALIFIED_NAME`](Self::QUALIFIED_NAME).
    fn event_kind() -> &'static str;

    fn aggregate_category() -> &'static str;

    fn base_slots() -> BaseSlots {
        BaseSlots::DEFAULT
    }

    /// Merge `attrs` over the declared defaults and validate every required field.
    fn construct(attrs: Value) -> Result<Self, EventError>;
}

/// Attribute map consumed field by field during construction.
///
/// Null values count as absent. Whatever is left once every base slot and
/// declared field has been taken is rejected by [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct Attrs {
    event_kind: &'static str,
    map: Map<String, Value>,
}

impl Attrs {
    pub fn new(event_kind: &'static str, value: Value) -> Result<Self, EventError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(EventError::InvalidAttributes { event_kind }),
        };
        Ok(Self { event_kind, map })
    }

    pub fn event_kind(&self) -> &'static str {
        self.event_kind
    }

    /// True when `field` is present with a non-null value.
    pub fn contains(&self, field: &str) -> bool {
        self.map.get(field).is_some_and(|value| !value.is_null())
    }

    pub fn take<T: DeserializeOwned>(&mut self, field: &str) -> Result<Option<T>, EventError> {
        match self.map.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| EventError::InvalidField {
                    event_kind: self.event_kind,
                    field: field.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn require<T: DeserializeOwned>(&mut self, field: &str) -> Result<T, EventError> {
        self.take(field)?
            .ok_or_else(|| EventError::MissingRequiredField {
                event_kind: self.event_kind,
                field: field.to_string(),
            })
    }

    /// Take a base slot according to how the event type declares it.
    pub fn slot<T: DeserializeOwned>(
        &mut self,
        field: &str,
        slot: Slot,
    ) -> Result<Option<T>, EventError> {
        match slot {
            Slot::Absent => {
                if self.contains(field) {
                    return Err(EventError::UnknownField {
                        event_kind: self.event_kind,
                        field: field.to_string(),
                    });
                }
                self.map.remove(field);
                Ok(None)
            }
            Slot::Optional => self.take(field),
            Slot::Required => self.require(field).map(Some),
        }
    }

    /// Fill a base slot with the type's declared default unless the caller set it.
    pub fn default_slot<T: Serialize + ?Sized>(
        &mut self,
        field: &str,
        default: &T,
    ) -> Result<(), EventError> {
        if self.contains(field) {
            return Ok(());
        }
        let value = serde_json::to_value(default).map_err(|e| EventError::InvalidField {
            event_kind: self.event_kind,
            field: field.to_string(),
            reason: e.to_string(),
        })?;
        self.map.insert(field.to_string(), value);
        Ok(())
    }

    /// Reject any attribute the event type does not declare.
    pub fn finish(self) -> Result<(), EventError> {
        match self.map.into_iter().next() {
            Some((field, _)) => Err(EventError::UnknownField {
                event_kind: self.event_kind,
                field,
            }),
            None => Ok(()),
        }
    }
}

/// `"Documents.Events.DocumentCreated"` / `"Documents::DocumentCreated"` ->
/// `"documents.document_created"`: first and last segment, snake-cased, dot-joined.
pub fn derive_event_kind(qualified_name: &str) -> String {
    let segments: Vec<&str> = qualified_name
        .split(['.', ':'])
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [] => String::new(),
        [name] => snake_case(name),
        [context, .., name] => format!("{}.{}", snake_case(context), snake_case(name)),
    }
}

/// `ProjectCreated` -> `project_created`, `HTTPRequestSent` -> `http_request_sent`.
pub fn snake_case(segment: &str) -> String {
    let chars: Vec<char> = segment.chars().collect();
    let mut out = String::with_capacity(segment.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    out
}

/// Declare a domain event type.
///
/// ```ignore
/// domain_event! {
///     /// A project was created inside a workspace.
///     pub struct ProjectCreated {
///         context: Projects,
///         aggregate: "project",
///         slots: { workspace_id: Required },
///         fields: {
///             project_id: String,
///             name: String,
///             description: Option<String> = None,
///         },
///     }
/// }
/// ```
///
/// - A field without `= default` is required; with one it is optional.
/// - `slots` re-declares base slots (`workspace_id`, `target_user_id`) as
///   `Absent`/`Optional`/`Required` and/or gives them a default
///   (`workspace_id = "global"`). The base slot is reused, never duplicated.
///   A type only carries `target_user_id` if it declares that slot.
/// - A declared field named like a base field (`workspace_id: String`) takes
///   over that slot: its required-ness and default win, the value lives in the
///   base slot and the accessor reads it from there.
/// - The kind is derived from `Context::Name`.
#[macro_export]
macro_rules! domain_event {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            context: $context:ident,
            aggregate: $aggregate:literal,
            $( slots: { $( $slot:ident $( : $rule:ident )? $( = $slot_default:expr )? ),* $(,)? }, )?
            fields: {
                $( $(#[$field_attr:meta])* $field:ident : $ty:ty $( = $default:expr )? ),* $(,)?
            } $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $name {
            meta: $crate::EventMeta,
            $( $field: $ty, )*
        }

        // Base fields come from `meta`; a declared field sharing a base name
        // mirrors its slot and is not written twice.
        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                use $crate::__private::serde::ser::{Error as _, SerializeMap as _};

                let meta = $crate::__private::serde_json::to_value(&self.meta)
                    .map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(None)?;
                if let $crate::__private::serde_json::Value::Object(meta) = meta {
                    for (key, value) in &meta {
                        map.serialize_entry(key, value)?;
                    }
                }
                $(
                    if !$crate::EventMeta::is_base_field(stringify!($field)) {
                        map.serialize_entry(stringify!($field), &self.$field)?;
                    }
                )*
                map.end()
            }
        }

        impl $name {
            $(
                $(#[$field_attr])*
                pub fn $field(&self) -> &$ty {
                    &self.$field
                }
            )*
        }

        impl $crate::EventDefinition for $name {
            const QUALIFIED_NAME: &'static str =
                concat!(stringify!($context), "::", stringify!($name));

            fn event_kind() -> &'static str {
                static KIND: ::std::sync::OnceLock<::std::string::String> =
                    ::std::sync::OnceLock::new();
                KIND.get_or_init(|| $crate::derive_event_kind(Self::QUALIFIED_NAME))
                    .as_str()
            }

            fn aggregate_category() -> &'static str {
                $aggregate
            }

            fn base_slots() -> $crate::BaseSlots {
                #[allow(unused_mut)]
                let mut slots = $crate::BaseSlots::DEFAULT;
                $( $( $( slots.$slot = $crate::Slot::$rule; )? )* )?
                $( slots.declare_field(stringify!($field), $crate::__event_field_has_default!($($default)?)); )*
                slots
            }

            fn construct(
                attrs: $crate::__private::serde_json::Value,
            ) -> ::core::result::Result<Self, $crate::EventError> {
                #[allow(unused_mut)]
                let mut attrs = $crate::Attrs::new(
                    <Self as $crate::EventDefinition>::event_kind(),
                    attrs,
                )?;
                $( $( $( attrs.default_slot(stringify!($slot), &$slot_default)?; )? )* )?
                $( $(
                    if $crate::EventMeta::accepts_default(stringify!($field)) {
                        let value: $ty = $default;
                        attrs.default_slot(stringify!($field), &value)?;
                    }
                )? )*
                let meta = $crate::EventMeta::from_attrs(
                    &mut attrs,
                    <Self as $crate::EventDefinition>::base_slots(),
                )?;
                $(
                    let $field: $ty = if $crate::EventMeta::is_base_field(stringify!($field)) {
                        meta.base_field(attrs.event_kind(), stringify!($field))?
                    } else {
                        $crate::__event_field!(attrs, $field, $ty $(, $default)?)
                    };
                )*
                attrs.finish()?;
                Ok(Self { meta, $( $field, )* })
            }
        }

        impl $crate::DomainEvent for $name {
            fn kind(&self) -> &'static str {
                <Self as $crate::EventDefinition>::event_kind()
            }

            fn category(&self) -> &'static str {
                <Self as $crate::EventDefinition>::aggregate_category()
            }

            fn meta(&self) -> &$crate::EventMeta {
                &self.meta
            }

            fn targets_user(&self) -> bool {
                <Self as $crate::EventDefinition>::base_slots().declares_target_user()
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_field_has_default {
    () => {
        false
    };
    ($default:expr) => {
        true
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __event_field {
    ($attrs:ident, $field:ident, $ty:ty) => {
        $attrs.require::<$ty>(stringify!($field))?
    };
    ($attrs:ident, $field:ident, $ty:ty, $default:expr) => {
        $attrs
            .take::<$ty>(stringify!($field))?
            .unwrap_or_else(|| $default)
    };
}

/// Declare a sum type over event types (each variant is named after its type).
///
/// Generates `From<Variant>`, `TryFrom<Union> for Variant` (handing the union
/// back on mismatch), a delegating [`DomainEvent`] impl, `kinds()` and a
/// registry lookup `construct(kind, attrs)`.
#[macro_export]
macro_rules! event_union {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize)]
        #[serde(untagged)]
        $vis enum $name {
            $( $variant($variant), )+
        }

        impl $name {
            /// Kinds of every member type, in declaration order.
            pub fn kinds() -> ::std::vec::Vec<&'static str> {
                ::std::vec![ $( <$variant as $crate::EventDefinition>::event_kind() ),+ ]
            }

            /// Construct the member whose kind is `kind`.
            pub fn construct(
                kind: &str,
                attrs: $crate::__private::serde_json::Value,
            ) -> ::core::result::Result<Self, $crate::EventError> {
                $(
                    if kind == <$variant as $crate::EventDefinition>::event_kind() {
                        return <$variant as $crate::EventDefinition>::construct(attrs)
                            .map(Self::$variant);
                    }
                )+
                Err($crate::EventError::UnknownKind { kind: kind.to_string() })
            }
        }

        $(
            impl ::core::convert::From<$variant> for $name {
                fn from(event: $variant) -> Self {
                    Self::$variant(event)
                }
            }

            impl ::core::convert::TryFrom<$name> for $variant {
                type Error = $name;

                fn try_from(event: $name) -> ::core::result::Result<Self, $name> {
                    match event {
                        $name::$variant(inner) => Ok(inner),
                        #[allow(unreachable_patterns)]
                        other => Err(other),
                    }
                }
            }
        )+

        impl $crate::DomainEvent for $name {
            fn kind(&self) -> &'static str {
                match self {
                    $( Self::$variant(event) => $crate::DomainEvent::kind(event), )+
                }
            }

            fn category(&self) -> &'static str {
                match self {
                    $( Self::$variant(event) => $crate::DomainEvent::category(event), )+
                }
            }

            fn meta(&self) -> &$crate::EventMeta {
                match self {
                    $( Self::$variant(event) => $crate::DomainEvent::meta(event), )+
                }
            }

            fn targets_user(&self) -> bool {
                match self {
                    $( Self::$variant(event) => $crate::DomainEvent::targets_user(event), )+
                }
            }
        }
    };
}
