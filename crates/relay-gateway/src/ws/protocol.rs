//! JSON text frames exchanged with WebSocket clients.
//!
//! Inbound: `{"event": "<name>", "args": [...]}`. A subscription request uses the
//! configured event name with `args = [field_name, expected_value, topic]`.
//!
//! Outbound: `{"event": "<channel>", "data": <payload>}`.

use crate::delivery::OutboundMessage;
use serde::Deserialize;
use serde_json::Value;

/// A raw inbound frame.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Arguments of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub field_name: String,
    pub expected_value: String,
    pub topic: String,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Subscribe(SubscribeRequest),
    /// Any event other than the subscription event.
    Other(String),
}

/// Inbound frame decoding failure.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid arguments for {event}: expected [name, value, topic] strings")]
    InvalidArgs { event: String },
}

/// Decode a text frame, treating `subscribe_event` as a subscription request.
pub fn parse_frame(text: &str, subscribe_event: &str) -> Result<Inbound, FrameError> {
    let frame: InboundFrame = serde_json::from_str(text)?;
    if frame.event != subscribe_event {
        return Ok(Inbound::Other(frame.event));
    }

    match frame.args.as_slice() {
        [Value::String(name), Value::String(value), Value::String(topic)] if !topic.is_empty() => {
            Ok(Inbound::Subscribe(SubscribeRequest {
                field_name: name.clone(),
                expected_value: value.clone(),
                topic: topic.clone(),
            }))
        }
        _ => Err(FrameError::InvalidArgs { event: frame.event }),
    }
}

/// Encode an outbound message as a text frame.
pub fn encode_outbound(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}
