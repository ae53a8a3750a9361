//! Typed error type for the store crate.

use thiserror::Error;

use crate::FlowId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("flow {0} not found")]
    NotFound(FlowId),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
