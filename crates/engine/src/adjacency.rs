//! Index-based adjacency built from a graph's flat edge list.

use std::collections::HashMap;

use nodes::NodeKind;

use crate::models::Graph;

/// Outgoing/incoming lists keyed by node position in `graph.nodes`.
///
/// Only the first node carrying a given id is indexed; edges whose endpoints
/// are unknown are skipped (the validator reports them separately).
pub(crate) struct Adjacency<'g> {
    pub index: HashMap<&'g str, usize>,
    pub outgoing: Vec<Vec<usize>>,
    pub incoming: Vec<Vec<usize>>,
}

impl<'g> Adjacency<'g> {
    /// Adjacency over every edge of the graph.
    pub fn build(graph: &'g Graph) -> Self {
        Self::build_filtered(graph, |_| true)
    }

    /// Adjacency over the edges data actually flows along: edges leaving a
    /// Response node lead nowhere in the generated handler.
    pub fn effective(graph: &'g Graph) -> Self {
        Self::build_filtered(graph, |kind| kind != NodeKind::Response)
    }

    fn build_filtered(graph: &'g Graph, keep_source: impl Fn(NodeKind) -> bool) -> Self {
        let mut index = HashMap::with_capacity(graph.nodes.len());
        for (i, node) in graph.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }

        let mut outgoing = vec![Vec::new(); graph.nodes.len()];
        let mut incoming = vec![Vec::new(); graph.nodes.len()];

        for edge in &graph.edges {
            let (Some(&from), Some(&to)) =
                (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
            else {
                continue;
            };
            if !keep_source(graph.nodes[from].kind()) {
                continue;
            }
            outgoing[from].push(to);
            incoming[to].push(from);
        }

        Self { index, outgoing, incoming }
    }

    /// Whether `position` is the indexed node for its id (not a duplicate).
    pub fn is_canonical(&self, position: usize, id: &str) -> bool {
        self.index.get(id) == Some(&position)
    }
}
