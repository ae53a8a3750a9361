//! Saving and loading flows through a [`FlowStore`].
//!
//! The store keeps definitions as opaque JSON; this module is where they
//! become [`Graph`]s again.  A loaded graph is not trusted: callers validate
//! it like any freshly edited one.

use tracing::{debug, instrument};

use store::{FlowId, FlowStore};

use crate::models::Graph;
use crate::PersistenceError;

#[instrument(skip(store, graph), fields(nodes = graph.nodes.len()))]
pub async fn save_flow(store: &dyn FlowStore, name: &str, graph: &Graph) -> Result<FlowId, PersistenceError> {
    let definition = serde_json::to_value(graph)?;
    let row = store.save_flow(name, definition).await?;
    debug!(flow_id = %row.id, "flow saved");
    Ok(row.id)
}

#[instrument(skip(store))]
pub async fn load_flow(store: &dyn FlowStore, id: FlowId) -> Result<Graph, PersistenceError> {
    let row = store.load_flow(id).await?;
    let graph: Graph = serde_json::from_value(row.definition)?;
    debug!(name = %row.name, nodes = graph.nodes.len(), "flow loaded");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{MemoryStore, StoreError};
    use uuid::Uuid;

    use crate::models::{Edge, Node};
    use nodes::{HttpMethod, NodeConfig, ResponseFormat};

    #[tokio::test]
    async fn graph_round_trips_through_a_store() {
        let store = MemoryStore::new();
        let graph = Graph::new(
            vec![
                Node::new("t", "Start", NodeConfig::trigger(HttpMethod::Put, "/items")),
                Node::new("r", "Done", NodeConfig::response(ResponseFormat::Xml)),
            ],
            vec![Edge::new("t", "r")],
        );

        let id = save_flow(&store, "items", &graph).await.unwrap();
        let loaded = load_flow(&store, id).await.unwrap();
        assert_eq!(loaded, graph);
        assert_eq!(loaded.content_hash(), graph.content_hash());
    }

    #[tokio::test]
    async fn missing_and_malformed_flows_are_errors() {
        let store = MemoryStore::new();

        let missing = load_flow(&store, Uuid::new_v4()).await;
        assert!(matches!(missing, Err(PersistenceError::Store(StoreError::NotFound(_)))));

        let row = store
            .save_flow("bad", serde_json::json!({ "nodes": [{ "id": "x" }] }))
            .await
            .unwrap();
        let malformed = load_flow(&store, row.id).await;
        assert!(matches!(malformed, Err(PersistenceError::Definition(_))));
    }
}
