use super::level::GelfLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// GELF protocol version written into every message.
pub const GELF_VERSION: &str = "1.1";

/// Value of an additional GELF field.
///
/// GELF only allows strings and numbers for additional fields, so anything
/// else is rendered to text before it gets here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// A single log record flattened together with its scope and resource
/// enrichment, ready to be handed to a transport.
///
/// Additional fields are kept in a `BTreeMap` so that encoding the same
/// message twice produces identical bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMessage {
    pub version: &'static str,
    pub host: String,
    pub short_message: String,
    pub full_message: Option<String>,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub level: GelfLevel,
    pub facility: Option<String>,
    pub extra: BTreeMap<String, FieldValue>,
}

impl FlatMessage {
    pub fn new(host: impl Into<String>, short_message: impl Into<String>) -> Self {
        Self {
            version: GELF_VERSION,
            host: host.into(),
            short_message: short_message.into(),
            full_message: None,
            timestamp: 0.0,
            level: GelfLevel::Informational,
            facility: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn insert_extra(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Insert without replacing an existing field. A taken key gets the
    /// first free `_<n>` suffix, starting at 2. Returns the key used.
    pub fn insert_extra_unique(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> String {
        let key = key.into();
        let key = if self.extra.contains_key(&key) {
            (2..)
                .map(|n| format!("{key}_{n}"))
                .find(|candidate| !self.extra.contains_key(candidate))
                .unwrap_or_default()
        } else {
            key
        };
        self.extra.insert(key.clone(), value.into());
        key
    }

    pub fn extra(&self, key: &str) -> Option<&FieldValue> {
        self.extra.get(key)
    }

    pub fn with_facility(mut self, facility: impl Into<String>) -> Self {
        self.facility = Some(facility.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_defaults() {
        let message = FlatMessage::new("web-01", "hello");
        assert_eq!(message.version, "1.1");
        assert_eq!(message.host, "web-01");
        assert!(message.full_message.is_none());
        assert!(message.facility.is_none());
        assert!(message.extra.is_empty());
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&FieldValue::from("a")).unwrap(), "\"a\"");
        assert_eq!(serde_json::to_string(&FieldValue::from(2u32)).unwrap(), "2");
        assert_eq!(serde_json::to_string(&FieldValue::from(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_insert_extra_unique_keeps_existing_values() {
        let mut message = FlatMessage::new("web-01", "hello");
        assert_eq!(message.insert_extra_unique("user_id", "a"), "user_id");
        assert_eq!(message.insert_extra_unique("user_id", "b"), "user_id_2");
        assert_eq!(message.insert_extra_unique("user_id", "c"), "user_id_3");

        assert_eq!(message.extra("user_id"), Some(&FieldValue::from("a")));
        assert_eq!(message.extra("user_id_2"), Some(&FieldValue::from("b")));
        assert_eq!(message.extra("user_id_3"), Some(&FieldValue::from("c")));
    }
}
