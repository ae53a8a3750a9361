//! Engine-level error types.

use thiserror::Error;

use crate::Diagnostic;

/// Errors produced when applying an editor mutation to a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("a node with id '{0}' already exists")]
    DuplicateNode(String),

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("edge '{0}' not found")]
    EdgeNotFound(String),

    #[error("edge '{0}' already exists")]
    DuplicateEdge(String),
}

/// Internal invariant violations detected while lowering a schedule.
///
/// On validated, scheduled input none of these can occur; seeing one means
/// the generator was handed something it must never be handed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("cannot generate a handler from an empty schedule")]
    EmptySchedule,

    #[error("schedule must start with the trigger node, found '{0}'")]
    TriggerNotFirst(String),

    #[error("unexpected second trigger node '{0}' in schedule")]
    UnexpectedTrigger(String),

    #[error("node '{node_id}' has no emission rule for its config: '{field}' is not set")]
    IncompleteConfig { node_id: String, field: &'static str },

    #[error("schedule contains no response node")]
    NoResponse,
}

/// Failure of the full validate → schedule → generate pipeline.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The graph broke structural or config invariants.
    #[error("flow is invalid ({} diagnostic(s))", .0.len())]
    Invalid(Vec<Diagnostic>),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Failure reported by an external publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The hosting layer could not be reached or timed out.
    #[error("publisher unavailable: {0}")]
    Unavailable(String),

    /// The hosting layer refused the manifest.
    #[error("publisher rejected manifest: {0}")]
    Rejected(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deployment failed; nothing was recorded, so the caller may retry.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("failed to publish endpoint '{endpoint_id}': {source}")]
    Publish {
        endpoint_id: String,
        #[source]
        source: PublishError,
    },
}

/// Errors from saving or loading a flow.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("stored definition is not a valid flow: {0}")]
    Definition(#[from] serde_json::Error),
}
