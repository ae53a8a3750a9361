//! Structural validation of a flow graph.
//!
//! Rules enforced:
//! 1. Node ids are unique.
//! 2. Exactly one Trigger node, at least one Response node.
//! 3. Every edge references existing nodes (both `source` and `target`).
//! 4. No cycle is reachable from the Trigger.
//! 5. Every node is reachable from the Trigger along edges data flows on.
//! 6. Every node's config satisfies its kind's contract.
//!
//! All rules run on every call and every finding is collected, so the editor
//! can show the complete list at once.  Shape warnings (branching, ignored
//! edges, several exits) never make validation fail.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use nodes::NodeKind;

use crate::adjacency::Adjacency;
use crate::models::{Graph, Node};
use crate::{Diagnostic, DiagnosticCode};

/// A graph that passed validation.
///
/// Only a `ValidGraph` can be scheduled, which keeps unvalidated graphs away
/// from the scheduler and the generator.
#[derive(Debug, Clone)]
pub struct ValidGraph<'g> {
    graph: &'g Graph,
    trigger: &'g Node,
    warnings: Vec<Diagnostic>,
}

impl<'g> ValidGraph<'g> {
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// The single entry node.
    pub fn trigger(&self) -> &'g Node {
        self.trigger
    }

    /// Non-fatal findings, in check order.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}

/// Validate `graph` and return it wrapped as a [`ValidGraph`].
///
/// # Errors
/// Every error diagnostic found, followed by every warning.
pub fn validate(graph: &Graph) -> Result<ValidGraph<'_>, Vec<Diagnostic>> {
    let all = Adjacency::build(graph);
    let effective = Adjacency::effective(graph);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_unique_ids(graph, &mut errors);
    check_entry_and_exit(graph, &mut errors);
    check_dangling_edges(graph, &mut errors);

    let roots: Vec<usize> = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, n)| n.kind() == NodeKind::Trigger && all.is_canonical(*i, &n.id))
        .map(|(i, _)| i)
        .collect();

    check_cycles(graph, &all, &roots, &mut errors);
    check_reachability(graph, &effective, &roots, &mut errors);
    check_configs(graph, &mut errors);
    check_shape(graph, &all, &effective, &mut warnings);

    debug!(
        "validated {} nodes / {} edges: {} error(s), {} warning(s)",
        graph.nodes.len(),
        graph.edges.len(),
        errors.len(),
        warnings.len()
    );

    match (errors.is_empty(), roots.as_slice()) {
        (true, &[trigger]) => Ok(ValidGraph {
            graph,
            trigger: &graph.nodes[trigger],
            warnings,
        }),
        _ => {
            errors.extend(warnings);
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Unique ids
// ---------------------------------------------------------------------------

fn check_unique_ids(graph: &Graph, errors: &mut Vec<Diagnostic>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) && reported.insert(node.id.as_str()) {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::DuplicateNodeId,
                    format!("duplicate node id '{}'", node.id),
                )
                .with_nodes([node.id.as_str()]),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Entry and exit
// ---------------------------------------------------------------------------

fn check_entry_and_exit(graph: &Graph, errors: &mut Vec<Diagnostic>) {
    let triggers: Vec<&str> = graph
        .nodes_of_kind(NodeKind::Trigger)
        .map(|n| n.id.as_str())
        .collect();

    match triggers.len() {
        0 => errors.push(Diagnostic::error(
            DiagnosticCode::MissingEntry,
            "missing entry node: the flow has no trigger",
        )),
        1 => {}
        n => errors.push(
            Diagnostic::error(
                DiagnosticCode::DuplicateEntry,
                format!("the flow has {n} trigger nodes; exactly one is allowed"),
            )
            .with_nodes(triggers),
        ),
    }

    if graph.nodes_of_kind(NodeKind::Response).next().is_none() {
        errors.push(Diagnostic::error(
            DiagnosticCode::MissingExit,
            "missing exit node: the flow has no response",
        ));
    }
}

// ---------------------------------------------------------------------------
// 3. Edge endpoints
// ---------------------------------------------------------------------------

fn check_dangling_edges(graph: &Graph, errors: &mut Vec<Diagnostic>) {
    for edge in &graph.edges {
        for (side, id) in [("source", &edge.source), ("target", &edge.target)] {
            if !graph.contains(id) {
                errors.push(
                    Diagnostic::error(
                        DiagnosticCode::DanglingEdge,
                        format!("edge {} references unknown {side} node '{id}'", edge.id()),
                    )
                    .with_nodes([id.as_str()])
                    .with_edge(edge.id()),
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 4. Cycles (three-colour DFS from the trigger)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn check_cycles(graph: &Graph, adj: &Adjacency<'_>, roots: &[usize], errors: &mut Vec<Diagnostic>) {
    let mut color = vec![Color::White; graph.nodes.len()];
    let mut reported: HashSet<Vec<usize>> = HashSet::new();

    for &root in roots {
        if color[root] != Color::White {
            continue;
        }

        // (node, index of the next outgoing edge to follow)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        color[root] = Color::Gray;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(&succ) = adj.outgoing[node].get(frame.1) else {
                color[node] = Color::Black;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match color[succ] {
                Color::White => {
                    color[succ] = Color::Gray;
                    stack.push((succ, 0));
                }
                Color::Gray => {
                    // Back-edge: the cycle is the stack from `succ` to `node`.
                    let start = stack.iter().position(|&(n, _)| n == succ).unwrap_or(0);
                    let cycle: Vec<usize> = stack[start..].iter().map(|&(n, _)| n).collect();

                    let mut key = cycle.clone();
                    key.sort_unstable();
                    if reported.insert(key) {
                        errors.push(cycle_diagnostic(graph, &cycle));
                    }
                }
                Color::Black => {}
            }
        }
    }
}

fn cycle_diagnostic(graph: &Graph, cycle: &[usize]) -> Diagnostic {
    let ids: Vec<&str> = cycle.iter().map(|&i| graph.nodes[i].id.as_str()).collect();
    let mut path = ids.join(" -> ");
    if let Some(first) = ids.first() {
        path.push_str(" -> ");
        path.push_str(first);
    }
    Diagnostic::error(DiagnosticCode::Cycle, format!("cycle detected: {path}")).with_nodes(ids)
}

// ---------------------------------------------------------------------------
// 5. Reachability (BFS from the trigger)
// ---------------------------------------------------------------------------

fn check_reachability(
    graph: &Graph,
    adj: &Adjacency<'_>,
    roots: &[usize],
    errors: &mut Vec<Diagnostic>,
) {
    // Without an entry there is nothing to be reachable from; the missing
    // trigger is already reported.
    if roots.is_empty() {
        return;
    }

    let mut visited = vec![false; graph.nodes.len()];
    let mut queue: VecDeque<usize> = roots.iter().copied().collect();
    for &root in roots {
        visited[root] = true;
    }

    while let Some(node) = queue.pop_front() {
        for &succ in &adj.outgoing[node] {
            if !visited[succ] {
                visited[succ] = true;
                queue.push_back(succ);
            }
        }
    }

    for (i, node) in graph.nodes.iter().enumerate() {
        if visited[i] || !adj.is_canonical(i, &node.id) {
            continue;
        }
        errors.push(
            Diagnostic::error(
                DiagnosticCode::Unreachable,
                format!("{} node '{}' is not reachable from the trigger", node.kind(), node.id),
            )
            .with_nodes([node.id.as_str()]),
        );
    }
}

// ---------------------------------------------------------------------------
// 6. Per-node config contract
// ---------------------------------------------------------------------------

fn check_configs(graph: &Graph, errors: &mut Vec<Diagnostic>) {
    for node in &graph.nodes {
        for issue in node.config.check_contract() {
            errors.push(
                Diagnostic::error(
                    DiagnosticCode::Config { field: issue.field().to_owned() },
                    format!("{} node '{}': {}", node.kind(), node.id, issue),
                )
                .with_nodes([node.id.as_str()]),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn check_shape(
    graph: &Graph,
    all: &Adjacency<'_>,
    effective: &Adjacency<'_>,
    warnings: &mut Vec<Diagnostic>,
) {
    for (i, node) in graph.nodes.iter().enumerate() {
        if !all.is_canonical(i, &node.id) {
            continue;
        }

        if node.kind() == NodeKind::Response {
            let ignored: Vec<_> = graph.edges.iter().filter(|e| e.source == node.id).collect();
            if !ignored.is_empty() {
                let mut d = Diagnostic::warning(
                    DiagnosticCode::ResponseHasOutgoing,
                    format!(
                        "response node '{}' has {} outgoing edge(s); they are ignored",
                        node.id,
                        ignored.len()
                    ),
                )
                .with_nodes([node.id.as_str()]);
                for edge in ignored {
                    d = d.with_edge(edge.id());
                }
                warnings.push(d);
            }
        }

        let fan_out = effective.outgoing[i].len();
        if fan_out > 1 {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticCode::Branching,
                    format!(
                        "node '{}' fans out to {fan_out} nodes; branches run one after another in a single pipeline",
                        node.id
                    ),
                )
                .with_nodes([node.id.as_str()]),
            );
        }

        let fan_in = effective.incoming[i].len();
        if fan_in > 1 {
            warnings.push(
                Diagnostic::warning(
                    DiagnosticCode::Branching,
                    format!(
                        "node '{}' merges {fan_in} inputs; it receives only the previous step's output",
                        node.id
                    ),
                )
                .with_nodes([node.id.as_str()]),
            );
        }
    }

    let exits: Vec<&str> = graph
        .nodes_of_kind(NodeKind::Response)
        .map(|n| n.id.as_str())
        .collect();
    if exits.len() > 1 {
        warnings.push(
            Diagnostic::warning(
                DiagnosticCode::MultipleExits,
                format!(
                    "the flow has {} response nodes; only the first one scheduled answers the request",
                    exits.len()
                ),
            )
            .with_nodes(exits),
        );
    }
}
