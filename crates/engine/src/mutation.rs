//! Editor operations on a [`Graph`].
//!
//! Every mutation produces a new graph; the input is never touched, so a
//! snapshot handed to a running preview stays valid.

use serde::{Deserialize, Serialize};

use nodes::NodeConfig;

use crate::models::{Edge, Graph, Node};
use crate::MutationError;

/// One user edit, as sent by the editing surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    AddNode { node: Node },
    UpdateNodeConfig { id: String, config: NodeConfig },
    UpdateNodeLabel { id: String, label: String },
    /// Removes the node together with every edge touching it.
    DeleteNode { id: String },
    /// Endpoints are not checked; dangling edges are reported by validation.
    AddEdge { edge: Edge },
    DeleteEdge { edge: Edge },
}

impl Graph {
    /// Return a copy of this graph with `mutation` applied.
    pub fn apply(&self, mutation: Mutation) -> Result<Graph, MutationError> {
        let mut next = self.clone();

        match mutation {
            Mutation::AddNode { node } => {
                if next.contains(&node.id) {
                    return Err(MutationError::DuplicateNode(node.id));
                }
                next.nodes.push(node);
            }
            Mutation::UpdateNodeConfig { id, config } => {
                next.node_mut(&id)?.config = config;
            }
            Mutation::UpdateNodeLabel { id, label } => {
                next.node_mut(&id)?.label = label;
            }
            Mutation::DeleteNode { id } => {
                if !next.contains(&id) {
                    return Err(MutationError::NodeNotFound(id));
                }
                next.nodes.retain(|n| n.id != id);
                next.edges.retain(|e| e.source != id && e.target != id);
            }
            Mutation::AddEdge { edge } => {
                if next.edges.contains(&edge) {
                    return Err(MutationError::DuplicateEdge(edge.id()));
                }
                next.edges.push(edge);
            }
            Mutation::DeleteEdge { edge } => {
                let pos = next
                    .edges
                    .iter()
                    .position(|e| *e == edge)
                    .ok_or_else(|| MutationError::EdgeNotFound(edge.id()))?;
                next.edges.remove(pos);
            }
        }

        Ok(next)
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node, MutationError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| MutationError::NodeNotFound(id.to_owned()))
    }
}
