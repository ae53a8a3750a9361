//! One user's editing session over a single flow.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::Graph;
use crate::mutation::Mutation;
use crate::preview::{Epoch, PreviewOutcome, PreviewSink, PreviewSynchronizer};
use crate::MutationError;

/// Owns the graph being edited and keeps its preview current.
pub struct EditSession<S> {
    graph: Graph,
    preview: Arc<PreviewSynchronizer<S>>,
}

impl<S: PreviewSink + 'static> EditSession<S> {
    pub fn new(graph: Graph, preview: Arc<PreviewSynchronizer<S>>) -> Self {
        Self { graph, preview }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn preview(&self) -> &Arc<PreviewSynchronizer<S>> {
        &self.preview
    }

    /// Regenerate the preview for the graph as it stands.
    pub fn refresh(&self) -> (Epoch, JoinHandle<Option<PreviewOutcome>>) {
        self.preview.spawn(self.graph.clone())
    }

    /// Apply `mutation` and schedule a regeneration for the result.
    ///
    /// A rejected mutation leaves the graph unchanged and opens no epoch.
    pub fn apply(
        &mut self,
        mutation: Mutation,
    ) -> Result<(Epoch, JoinHandle<Option<PreviewOutcome>>), MutationError> {
        self.graph = self.graph.apply(mutation)?;
        debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "graph updated"
        );
        Ok(self.refresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratorConfig;
    use crate::models::{Edge, Node};
    use crate::preview::RecordingSink;
    use nodes::{HttpMethod, NodeConfig, ResponseFormat};

    #[tokio::test]
    async fn edits_drive_the_preview() {
        let preview = Arc::new(PreviewSynchronizer::new(
            Arc::new(RecordingSink::new()),
            GeneratorConfig::default(),
        ));
        let mut session = EditSession::new(
            Graph::with_trigger("start", HttpMethod::Get, "/ping"),
            Arc::clone(&preview),
        );

        let (_, handle) = session
            .apply(Mutation::AddNode {
                node: Node::new("reply", "", NodeConfig::response(ResponseFormat::Json)),
            })
            .unwrap();
        // Unconnected response: the preview shows diagnostics.
        assert!(matches!(handle.await.unwrap(), Some(PreviewOutcome::Invalid(_))));

        let (epoch, handle) = session
            .apply(Mutation::AddEdge { edge: Edge::new("start", "reply") })
            .unwrap();
        assert!(matches!(handle.await.unwrap(), Some(PreviewOutcome::Artifact(_))));
        assert_eq!(preview.last_published(), Some(epoch));

        let before = preview.current_epoch();
        let rejected = session.apply(Mutation::DeleteNode { id: "ghost".into() });
        assert_eq!(rejected.err(), Some(MutationError::NodeNotFound("ghost".into())));
        assert_eq!(preview.current_epoch(), before);
        assert_eq!(session.graph().nodes.len(), 2);
    }
}
