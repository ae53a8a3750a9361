//! In-process flow store, used by the editor session and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{sort_newest_first, FlowStore};
use crate::{FlowId, FlowRow, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<FlowId, FlowRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn save_flow(
        &self,
        name: &str,
        definition: serde_json::Value,
    ) -> Result<FlowRow, StoreError> {
        let row = FlowRow::new(name, definition);
        debug!("saving flow '{}' as {}", name, row.id);
        self.rows.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn load_flow(&self, id: FlowId) -> Result<FlowRow, StoreError> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_flows(&self) -> Result<Vec<FlowRow>, StoreError> {
        let mut rows: Vec<FlowRow> = self.rows.read().await.values().cloned().collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError> {
        match self.rows.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        }
    }
}
