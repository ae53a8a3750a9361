//! Flow store backed by a directory of `<id>.json` files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{sort_newest_first, FlowStore};
use crate::{FlowId, FlowRow, StoreError};

#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        info!("opened flow store at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, id: FlowId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

#[async_trait]
impl FlowStore for JsonDirStore {
    async fn save_flow(
        &self,
        name: &str,
        definition: serde_json::Value,
    ) -> Result<FlowRow, StoreError> {
        let row = FlowRow::new(name, definition);
        let bytes = serde_json::to_vec_pretty(&row)?;
        tokio::fs::write(self.path_for(row.id), bytes).await?;
        debug!("saved flow '{}' as {}", name, row.id);
        Ok(row)
    }

    async fn load_flow(&self, id: FlowId) -> Result<FlowRow, StoreError> {
        let bytes = match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn list_flows(&self) -> Result<Vec<FlowRow>, StoreError> {
        let mut rows = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<FlowRow>(&bytes) {
                Ok(row) => rows.push(row),
                Err(e) => warn!("skipping unreadable flow file {}: {}", path.display(), e),
            }
        }

        sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn delete_flow(&self, id: FlowId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}
