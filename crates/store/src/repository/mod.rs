//! Flow repositories — one implementation per storage backend.
//!
//! Every operation returns a `Result<T, StoreError>`.
//! Definitions are stored verbatim; the engine owns their meaning.

use async_trait::async_trait;

use crate::{FlowId, FlowRow, StoreError};

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;

/// Save/load contract for named flows.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Persist a new flow and return the stored row (with its fresh id).
    async fn save_flow(
        &self,
        name: &str,
        definition: serde_json::Value,
    ) -> Result<FlowRow, StoreError>;

    /// Fetch a single flow by id.
    ///
    /// Returns [`StoreError::NotFound`] if no such flow exists.
    async fn load_flow(&self, id: FlowId) -> Result<FlowRow, StoreError>;

    /// All flows, newest first.
    async fn list_flows(&self) -> Result<Vec<FlowRow>, StoreError>;

    /// Permanently delete a flow.
    ///
    /// Returns [`StoreError::NotFound`] if nothing was deleted.
    async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError>;
}

/// Newest first; ties broken by id so listings are stable.
fn sort_newest_first(rows: &mut [FlowRow]) {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}
