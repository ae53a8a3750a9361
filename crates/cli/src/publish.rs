//! Publishes endpoints as files on disk.
//!
//! Each endpoint lands in `<root>/<endpointId>/` as `route.ts` plus the
//! `manifest.json` it was built from.  A directory that already holds the
//! same source is left alone; one holding a different source is never
//! overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use engine::{Manifest, PublishError, Publisher};

pub struct DirectoryPublisher {
    root: PathBuf,
    base_url: String,
}

impl DirectoryPublisher {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, manifest: &Manifest) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), manifest.endpoint_id)
    }

    /// Source hash recorded in `dir/manifest.json`, or `None` when the
    /// endpoint has never been written.
    async fn existing_source_hash(dir: &Path) -> Result<Option<String>, PublishError> {
        let path = dir.join("manifest.json");
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let existing: Manifest = serde_json::from_slice(&bytes).map_err(|e| {
            PublishError::Rejected(format!("unreadable manifest {}: {e}", path.display()))
        })?;
        Ok(Some(existing.source_hash))
    }
}

#[async_trait]
impl Publisher for DirectoryPublisher {
    async fn publish(&self, manifest: &Manifest) -> Result<String, PublishError> {
        let dir = self.root.join(&manifest.endpoint_id);

        match Self::existing_source_hash(&dir).await? {
            Some(hash) if hash == manifest.source_hash => {
                debug!(dir = %dir.display(), "endpoint already on disk");
                return Ok(self.url_for(manifest));
            }
            Some(hash) => {
                warn!(dir = %dir.display(), existing = %hash, "endpoint id holds another source");
                return Err(PublishError::Rejected(format!(
                    "endpoint {} already holds a different source ({hash})",
                    manifest.endpoint_id
                )));
            }
            None => {}
        }

        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| PublishError::Rejected(e.to_string()))?;

        fs::create_dir_all(&dir).await?;
        fs::write(dir.join("route.ts"), &manifest.source).await?;
        fs::write(dir.join("manifest.json"), json).await?;

        info!(dir = %dir.display(), "endpoint written");
        Ok(self.url_for(manifest))
    }
}
