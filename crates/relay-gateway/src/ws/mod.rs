//! WebSocket transport for the delivery bridge.
//!
//! - Connect registers the client, close removes it
//! - Subscription requests arrive as JSON text frames
//! - Deliveries leave as `{"event": "<value>.<topic>", "data": ...}`

pub mod handler;
pub mod protocol;

pub use handler::{SessionConfig, WebSocketHandler};
pub use protocol::{parse_frame, FrameError, Inbound, SubscribeRequest};
