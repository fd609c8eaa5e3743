//! # Bus Events
//!
//! Payloads are structured key/value documents carried as JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured event payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// Wrap a JSON document.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Look up a top-level field.
    ///
    /// A field holding `null` is reported as absent, as is any lookup on a
    /// payload that is not an object.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// The underlying document.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A publication on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Topic the event was published on.
    pub topic: String,
    /// Event body.
    pub payload: Payload,
}

impl BusEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_present_field() {
        let payload = Payload::new(json!({"level": "high"}));
        assert_eq!(payload.get("level"), Some(&json!("high")));
    }

    #[test]
    fn test_get_null_is_absent() {
        let payload = Payload::new(json!({"level": null}));
        assert!(payload.get("level").is_none());
    }

    #[test]
    fn test_get_on_non_object() {
        let payload = Payload::new(json!([1, 2, 3]));
        assert!(payload.get("level").is_none());
    }

    #[test]
    fn test_payload_serializes_transparently() {
        let payload = Payload::new(json!({"msg": "m1"}));
        let encoded = serde_json::to_string(&payload).unwrap();
        assert_eq!(encoded, r#"{"msg":"m1"}"#);
    }
}
