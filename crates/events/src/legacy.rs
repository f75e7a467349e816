//! Legacy message convention kept alive during the typed-event migration.
//!
//! Before typed events, contexts broadcast untyped tagged messages on ad-hoc
//! topics (`workspace:<id>`, `user:<id>`, ...). A [`LegacyTranslator`] rebuilds
//! those messages from typed events so unmigrated subscribers keep working.
//! Cases are deleted by hand once no consumer of a legacy topic remains.

use serde::Serialize;
use serde_json::Value;

/// Untyped tagged message: a tag plus ordered positional fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyMessage {
    tag: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl LegacyMessage {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v))
    }
}

/// Typed event → legacy `(topic, message)` pairs. Must be pure and total:
/// event types without a case yield an empty list.
pub trait LegacyTranslator<E>: Send + Sync {
    fn translate(&self, event: &E) -> Vec<(String, LegacyMessage)>;
}

/// Translator for buses with no legacy consumers left.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLegacy;

impl<E> LegacyTranslator<E> for NoLegacy {
    fn translate(&self, _event: &E) -> Vec<(String, LegacyMessage)> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_keeps_field_order() {
        let msg = LegacyMessage::new("project_added")
            .with("id", "p1")
            .with("position", 3);

        assert_eq!(msg.tag(), "project_added");
        assert_eq!(msg.fields()[0], ("id", json!("p1")));
        assert_eq!(msg.get("position"), Some(&json!(3)));
        assert_eq!(msg.get("missing"), None);
    }

    #[test]
    fn no_legacy_translates_to_nothing() {
        assert!(LegacyTranslator::<u32>::translate(&NoLegacy, &1).is_empty());
    }
}
