//! Connection identifiers.
//!
//! Uses UUID v7 so identifiers sort by connect time in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a live client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a new connection ID (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_ids_are_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn test_connection_id_serialization() {
        let id = ConnectionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
