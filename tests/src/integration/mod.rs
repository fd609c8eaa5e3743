//! Cross-crate delivery flows over the in-memory event bus.

pub mod delivery_flow;
