//! Core domain models for the flow compiler.
//!
//! A [`Graph`] is a flat arena: nodes and edges live in plain vectors and
//! refer to each other by id only.  Every traversal builds the adjacency it
//! needs on demand (see [`crate::adjacency`]).  Graphs serialise to the same
//! JSON the editor saves and the store persists.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use nodes::{HttpMethod, NodeConfig, NodeKind};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single step of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within this graph (referenced by edges).
    pub id: String,
    /// Free-form caption shown on the canvas.
    #[serde(default)]
    pub label: String,
    /// Kind-tagged configuration; the variant is the node's kind.
    pub config: NodeConfig,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, config: NodeConfig) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            config,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed edge: `target` consumes the output of `source`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Identifier used when a diagnostic points at this edge.
    pub fn id(&self) -> String {
        format!("{}->{}", self.source, self.target)
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A complete flow definition, as owned by one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// The graph a new editing session starts from: a lone Trigger node.
    pub fn with_trigger(id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        let trigger = Node::new(id, "Trigger", NodeConfig::trigger(method, path));
        Self::new(vec![trigger], Vec::new())
    }

    /// First node with the given id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    /// SHA-256 (hex) of the canonical JSON form of this graph.
    ///
    /// Node and edge order on the canvas does not affect the hash.
    pub fn content_hash(&self) -> String {
        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut edges: Vec<&Edge> = self.edges.iter().collect();
        edges.sort();

        #[derive(Serialize)]
        struct Canonical<'a> {
            nodes: Vec<&'a Node>,
            edges: Vec<&'a Edge>,
        }

        // Serialising plain structs and BTreeMaps cannot fail.
        let bytes = serde_json::to_vec(&Canonical { nodes, edges }).unwrap_or_default();
        sha256_hex(&bytes)
    }

    /// Render the graph as a Mermaid flowchart.
    ///
    /// Edges with a missing endpoint are left out.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");

        for (index, node) in self.nodes.iter().enumerate() {
            let caption = escape_mermaid(&caption_for(node));
            let shape = match node.kind() {
                NodeKind::Trigger => format!("n{index}([\"{caption}\"])"),
                NodeKind::Response => format!("n{index}[[\"{caption}\"]]"),
                NodeKind::Validate => format!("n{index}{{{{\"{caption}\"}}}}"),
                NodeKind::Database | NodeKind::Transform => format!("n{index}[\"{caption}\"]"),
            };
            out.push_str(&format!("    {shape}\n"));
        }

        let position = |id: &str| self.nodes.iter().position(|n| n.id == id);
        for edge in &self.edges {
            if let (Some(from), Some(to)) = (position(&edge.source), position(&edge.target)) {
                out.push_str(&format!("    n{from} --> n{to}\n"));
            }
        }

        out
    }
}

fn caption_for(node: &Node) -> String {
    let label = if node.label.is_empty() { node.id.as_str() } else { node.label.as_str() };
    match &node.config {
        NodeConfig::Trigger(t) => {
            let method = t.method.map(|m| m.as_str()).unwrap_or("?");
            let path = t.path.as_deref().unwrap_or("?");
            format!("{method} {path}")
        }
        _ => format!("{label} ({})", node.kind()),
    }
}

fn escape_mermaid(text: &str) -> String {
    text.replace('"', "#quot;").replace(['\n', '\r'], " ")
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
