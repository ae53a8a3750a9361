//! Deterministic execution order for a validated graph.
//!
//! Kahn's algorithm over the edges data flows along (edges leaving a
//! Response node are ignored).  Whenever several nodes are ready at once
//! the Trigger goes first, Responses go last, and ties are broken by
//! ascending id, so the same graph always yields the same order and the
//! generator emits byte-identical source.
//!
//! Nothing depends on a Response, so holding Responses back until no other
//! node is ready schedules every other node ahead of the first Response.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;

use nodes::NodeKind;

use crate::adjacency::Adjacency;
use crate::models::Node;
use crate::validate::ValidGraph;

/// Linearise `valid` into execution order.  The Trigger always comes first.
pub fn schedule<'g>(valid: &ValidGraph<'g>) -> Vec<&'g Node> {
    let graph = valid.graph();
    let adj = Adjacency::effective(graph);

    let canonical: Vec<usize> = (0..graph.nodes.len())
        .filter(|&i| adj.is_canonical(i, &graph.nodes[i].id))
        .collect();

    let mut in_degree: Vec<usize> = adj.incoming.iter().map(Vec::len).collect();

    // Min-heap keyed on (not-a-trigger, is-a-response, id).
    let key = |i: usize| {
        let node = &graph.nodes[i];
        let kind = node.kind();
        Reverse((kind != NodeKind::Trigger, kind == NodeKind::Response, node.id.as_str(), i))
    };

    let mut ready: BinaryHeap<_> = canonical
        .iter()
        .copied()
        .filter(|&i| in_degree[i] == 0)
        .map(key)
        .collect();

    let mut order: Vec<&'g Node> = Vec::with_capacity(canonical.len());

    while let Some(Reverse((_, _, _, i))) = ready.pop() {
        order.push(&graph.nodes[i]);

        for &succ in &adj.outgoing[i] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.push(key(succ));
            }
        }
    }

    debug_assert_eq!(order.len(), canonical.len(), "validated graph must be acyclic");
    debug!(
        "scheduled {} nodes: {:?}",
        order.len(),
        order.iter().map(|n| n.id.as_str()).collect::<Vec<_>>()
    );

    order
}
