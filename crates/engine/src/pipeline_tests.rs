//! End-to-end tests for the compile pipeline.
//!
//! These go through the public API only: validate → schedule → generate,
//! the preview synchronizer, and packaging/deployment with `MockPublisher`.

use std::collections::BTreeSet;
use std::sync::Arc;

use nodes::{FieldType, HttpMethod, NodeConfig, NodeKind, ResponseFormat};

use crate::mock::MockPublisher;
use crate::{
    compile, generate, schedule, validate, CompileError, Deployer, DiagnosticCode, EditSession,
    Edge, GeneratorConfig, Graph, Mutation, Node, Packager, PreviewOutcome, PreviewSynchronizer,
    RecordingSink,
};

/// Node with a complete config for its kind.
fn node(id: &str, kind: NodeKind) -> Node {
    let config = match kind {
        NodeKind::Trigger   => NodeConfig::trigger(HttpMethod::Post, "/users"),
        NodeKind::Database  => NodeConfig::database("users"),
        NodeKind::Transform => NodeConfig::transform("return input;"),
        NodeKind::Validate  => NodeConfig::validate([("email", FieldType::Email)]),
        NodeKind::Response  => NodeConfig::response(ResponseFormat::Json),
    };
    Node::new(id, id, config)
}

fn graph(nodes: &[(&str, NodeKind)], edges: &[(&str, &str)]) -> Graph {
    Graph::new(
        nodes.iter().map(|&(id, kind)| node(id, kind)).collect(),
        edges.iter().map(|&(a, b)| Edge::new(a, b)).collect(),
    )
}

/// `Trigger(POST /users) → Database(users) → Response(json)`.
fn users_flow() -> Graph {
    graph(
        &[
            ("trigger", NodeKind::Trigger),
            ("fetch", NodeKind::Database),
            ("respond", NodeKind::Response),
        ],
        &[("trigger", "fetch"), ("fetch", "respond")],
    )
}

fn diamond() -> Graph {
    graph(
        &[
            ("t", NodeKind::Trigger),
            ("a", NodeKind::Database),
            ("b", NodeKind::Transform),
            ("r", NodeKind::Response),
        ],
        &[("t", "a"), ("t", "b"), ("a", "r"), ("b", "r")],
    )
}

fn ids(order: &[&Node]) -> Vec<String> {
    order.iter().map(|n| n.id.clone()).collect()
}

/// Deterministic permutation of the canvas order, for order-independence checks.
fn rotated(g: &Graph, by: usize) -> Graph {
    let mut out = g.clone();
    let n = out.nodes.len();
    out.nodes.rotate_left(by % n.max(1));
    let m = out.edges.len();
    out.edges.rotate_right(by % m.max(1));
    out
}

// ============================================================
// Validation properties
// ============================================================

#[test]
fn well_formed_graphs_validate() {
    let flows = [
        users_flow(),
        diamond(),
        graph(
            &[
                ("t", NodeKind::Trigger),
                ("v", NodeKind::Validate),
                ("x", NodeKind::Transform),
                ("d", NodeKind::Database),
                ("r", NodeKind::Response),
            ],
            &[("t", "v"), ("v", "x"), ("x", "d"), ("d", "r")],
        ),
    ];

    for g in &flows {
        for by in 0..g.nodes.len() {
            assert!(validate(&rotated(g, by)).is_ok(), "rotation {by} of {g:?}");
        }
    }
}

#[test]
fn reported_cycles_are_cycles_in_the_edge_relation() {
    let g = graph(
        &[
            ("t", NodeKind::Trigger),
            ("p", NodeKind::Transform),
            ("q", NodeKind::Transform),
            ("s", NodeKind::Transform),
            ("r", NodeKind::Response),
        ],
        &[("t", "p"), ("p", "q"), ("q", "s"), ("s", "p"), ("q", "r")],
    );

    let diagnostics = validate(&g).unwrap_err();
    let cycles: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::Cycle)
        .collect();
    assert_eq!(cycles.len(), 1);

    let members = &cycles[0].nodes;
    for (i, from) in members.iter().enumerate() {
        let to = &members[(i + 1) % members.len()];
        assert!(
            g.edges.iter().any(|e| &e.source == from && &e.target == to),
            "{from} -> {to} is not an edge"
        );
    }
}

// ============================================================
// Scheduling properties
// ============================================================

#[test]
fn trigger_is_always_scheduled_first() {
    for g in [users_flow(), diamond()] {
        for by in 0..g.nodes.len() {
            let g = rotated(&g, by);
            let valid = validate(&g).unwrap();
            assert_eq!(schedule(&valid)[0].kind(), NodeKind::Trigger);
        }
    }
}

#[test]
fn diamond_branches_sit_between_trigger_and_response_in_stable_order() {
    let expected = {
        let g = diamond();
        let valid = validate(&g).unwrap();
        ids(&schedule(&valid))
    };
    assert_eq!(expected.first().map(String::as_str), Some("t"));
    assert_eq!(expected.last().map(String::as_str), Some("r"));

    for by in 0..4 {
        let g = rotated(&diamond(), by);
        let valid = validate(&g).unwrap();
        assert_eq!(ids(&schedule(&valid)), expected);
    }
}

#[test]
fn dead_end_branch_is_emitted_before_a_sibling_response() {
    // `r` sorts before `v`; the schema check must still run.
    let g = graph(
        &[
            ("t", NodeKind::Trigger),
            ("r", NodeKind::Response),
            ("v", NodeKind::Validate),
        ],
        &[("t", "r"), ("t", "v")],
    );

    for by in 0..g.nodes.len() {
        let g = rotated(&g, by);
        let valid = validate(&g).unwrap();
        let order = schedule(&valid);
        assert_eq!(order.last().map(|n| n.id.as_str()), Some("r"));

        let artifact = generate(&order, &GeneratorConfig::default()).unwrap();
        let non_responses: Vec<&str> = g
            .nodes
            .iter()
            .filter(|n| n.kind() != NodeKind::Response)
            .map(|n| n.id.as_str())
            .collect();
        for id in non_responses {
            assert!(artifact.steps.iter().any(|s| s == id), "{id} missing from {:?}", artifact.steps);
        }
        assert!(artifact.imports.contains("zod"));
    }
}

// ============================================================
// Generation properties
// ============================================================

#[test]
fn generation_is_deterministic() {
    let config = GeneratorConfig::default();
    for g in [users_flow(), diamond()] {
        let valid = validate(&g).unwrap();
        let first = generate(&schedule(&valid), &config).unwrap();
        let second = generate(&schedule(&valid), &config).unwrap();
        assert_eq!(first.source, second.source);

        // Canvas order does not leak into the output either.
        let shuffled = rotated(&g, 1);
        assert_eq!(compile(&shuffled, &config).unwrap().source, first.source);
    }
}

// ============================================================
// Scenarios
// ============================================================

#[test]
fn scenario_users_flow_compiles() {
    let g = users_flow();
    let valid = validate(&g).unwrap();
    assert!(valid.warnings().is_empty());

    let order = schedule(&valid);
    assert_eq!(ids(&order), vec!["trigger", "fetch", "respond"]);

    let artifact = generate(&order, &GeneratorConfig::default()).unwrap();
    let src = &artifact.source;
    assert_eq!(src.matches("await db.query(").count(), 1);
    assert_eq!(src.matches("NextResponse.json(previousResult").count(), 1);
    assert_eq!(src.matches("try {").count(), 1);
    assert_eq!(src.matches("catch (error)").count(), 1);
    assert_eq!(
        artifact.imports,
        BTreeSet::from(["@/lib/db".to_string(), "next/server".to_string()])
    );
}

#[test]
fn scenario_missing_trigger_is_reported() {
    let g = graph(
        &[("load", NodeKind::Database), ("shape", NodeKind::Transform)],
        &[("load", "shape")],
    );

    let err = compile(&g, &GeneratorConfig::default()).unwrap_err();
    let CompileError::Invalid(diagnostics) = &err else {
        panic!("expected diagnostics, got {err:?}");
    };
    let missing = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::MissingEntry)
        .expect("missing entry diagnostic");
    assert!(missing.message.contains("missing entry node"));
    assert!(missing.is_error());
}

#[test]
fn scenario_cycle_references_both_nodes() {
    let g = graph(
        &[
            ("t", NodeKind::Trigger),
            ("A", NodeKind::Transform),
            ("B", NodeKind::Transform),
        ],
        &[("t", "A"), ("A", "B"), ("B", "A")],
    );

    let diagnostics = validate(&g).unwrap_err();
    let cycle = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::Cycle)
        .expect("cycle diagnostic");
    let members: BTreeSet<&str> = cycle.nodes.iter().map(String::as_str).collect();
    assert_eq!(members, BTreeSet::from(["A", "B"]));
}

#[test]
fn scenario_missing_schema_is_scoped_to_the_validate_node() {
    let mut g = graph(
        &[
            ("t", NodeKind::Trigger),
            ("check", NodeKind::Validate),
            ("r", NodeKind::Response),
        ],
        &[("t", "check"), ("check", "r")],
    );
    g = g
        .apply(Mutation::UpdateNodeConfig {
            id: "check".into(),
            config: NodeConfig::empty(NodeKind::Validate),
        })
        .unwrap();

    let diagnostics = validate(&g).unwrap_err();
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, DiagnosticCode::Config { field: "schema".into() });
    assert_eq!(errors[0].nodes, vec!["check"]);
}

#[tokio::test]
async fn scenario_redeploying_an_unchanged_flow_is_idempotent() {
    let deployer = Deployer::new(MockPublisher::new("https://hooks.test"), Packager::default());
    let g = users_flow();

    let first = {
        let artifact = compile(&g, &GeneratorConfig::default()).unwrap();
        deployer.deploy(&artifact, &g).await.unwrap()
    };
    let second = {
        let artifact = compile(&g, &GeneratorConfig::default()).unwrap();
        deployer.deploy(&artifact, &g).await.unwrap()
    };

    assert_eq!(first.manifest.endpoint_id, second.manifest.endpoint_id);
    assert_eq!(first.url, second.url);
    assert_eq!(deployer.publisher().call_count(), 1);
}

// ============================================================
// Editing session
// ============================================================

#[tokio::test]
async fn building_a_flow_edit_by_edit_ends_with_its_handler() {
    let preview = Arc::new(PreviewSynchronizer::new(
        Arc::new(RecordingSink::new()),
        GeneratorConfig::default(),
    ));
    let mut session = EditSession::new(
        Graph::with_trigger("trigger", HttpMethod::Post, "/users"),
        Arc::clone(&preview),
    );

    let edits = [
        Mutation::AddNode { node: node("fetch", NodeKind::Database) },
        Mutation::AddNode { node: node("respond", NodeKind::Response) },
        Mutation::AddEdge { edge: Edge::new("trigger", "fetch") },
        Mutation::AddEdge { edge: Edge::new("fetch", "respond") },
    ];

    let mut handles = Vec::new();
    for edit in edits {
        handles.push(session.apply(edit).unwrap());
    }
    let last = handles.last().map(|(epoch, _)| *epoch).unwrap();
    for (_, handle) in handles {
        handle.await.unwrap();
    }

    assert_eq!(preview.last_published(), Some(last));
    let (_, outcome) = preview.sink().latest().unwrap();
    let PreviewOutcome::Artifact(artifact) = &outcome else {
        panic!("expected an artifact, got {outcome:?}");
    };
    assert_eq!(artifact.steps, vec!["trigger", "fetch", "respond"]);
    assert_eq!(
        artifact.source,
        compile(session.graph(), &GeneratorConfig::default()).unwrap().source
    );
}
