//! `MockPublisher` — a test double for [`Publisher`].
//!
//! Records every manifest it is asked to publish and can be switched into a
//! failing mode to exercise retry paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::deploy::Publisher;
use crate::package::Manifest;
use crate::PublishError;

pub struct MockPublisher {
    /// URLs are `<base_url>/<endpoint id>`.
    pub base_url: String,
    /// Endpoint ids seen by this publisher, in call order.
    pub calls: Arc<Mutex<Vec<String>>>,
    failing: AtomicBool,
}

impl MockPublisher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every publish fails with [`PublishError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of publish attempts, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, manifest: &Manifest) -> Result<String, PublishError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(manifest.endpoint_id.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::Unavailable("mock publisher is failing".into()));
        }
        Ok(format!("{}/{}", self.base_url, manifest.endpoint_id))
    }
}
