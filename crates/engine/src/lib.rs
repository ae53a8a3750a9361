//! `engine` crate — the flow compiler.
//!
//! A [`Graph`] drawn in the editor is validated, scheduled into a linear
//! execution order and lowered to a route-handler [`Artifact`].  Around that
//! pure pipeline sit the live preview ([`PreviewSynchronizer`]), packaging
//! and deployment ([`Packager`], [`Deployer`]) and flow persistence.

mod adjacency;

pub mod codegen;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod mock;
pub mod models;
pub mod mutation;
pub mod package;
pub mod persistence;
pub mod preview;
pub mod schedule;
pub mod session;
pub mod validate;

use tracing::{instrument, warn};

pub use codegen::{generate, Artifact, GeneratorConfig};
pub use deploy::{Deployer, Deployment, Publisher};
pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use error::{
    CompileError, DeploymentError, GenerationError, MutationError, PersistenceError, PublishError,
};
pub use models::{Edge, Graph, Node};
pub use mutation::Mutation;
pub use package::{Manifest, ManifestIndex, Packager, PackagerConfig};
pub use preview::{Epoch, PreviewOutcome, PreviewSink, PreviewState, PreviewSynchronizer, RecordingSink};
pub use schedule::schedule;
pub use session::EditSession;
pub use validate::{validate, ValidGraph};

/// Validate, schedule and generate in one step.
///
/// Warnings are logged and otherwise ignored.
#[instrument(skip_all, fields(nodes = graph.nodes.len(), edges = graph.edges.len()))]
pub fn compile(graph: &Graph, config: &GeneratorConfig) -> Result<Artifact, CompileError> {
    let valid = validate(graph).map_err(CompileError::Invalid)?;
    for warning in valid.warnings() {
        warn!("{warning}");
    }

    let order = schedule(&valid);
    Ok(generate(&order, config)?)
}

#[cfg(test)]
mod pipeline_tests;
