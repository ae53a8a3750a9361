//! Row structs for persisted flows.
//!
//! A row holds a saved definition and its bookkeeping, nothing more.
//! The `Graph` type they describe lives in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a saved flow.
pub type FlowId = Uuid;

/// A saved flow: a user-chosen name plus the full JSON graph definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub id: FlowId,
    pub name: String,
    /// Full JSON graph definition (nodes, edges).
    pub definition: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl FlowRow {
    pub fn new(name: impl Into<String>, definition: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            definition,
            created_at: Utc::now(),
        }
    }
}
