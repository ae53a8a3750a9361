//! Diagnostics reported by the structural validator.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// What a diagnostic is about.
///
/// Structural codes name the graph invariant that was broken; `Config`
/// names the node config field that failed its kind's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// No Trigger node.
    MissingEntry,
    /// More than one Trigger node.
    DuplicateEntry,
    /// No Response node.
    MissingExit,
    /// Two nodes share an id.
    DuplicateNodeId,
    /// An edge points at a node that does not exist.
    DanglingEdge,
    /// A cycle is reachable from the Trigger.
    Cycle,
    /// A node cannot be reached from the Trigger.
    Unreachable,
    /// A node's config violates its kind's contract.
    Config { field: String },

    // ------ Warnings ------
    /// A Response node has outgoing edges; they are ignored.
    ResponseHasOutgoing,
    /// Fan-out or fan-in, lowered as a linear pipeline.
    Branching,
    /// More than one Response node; only the first scheduled one answers.
    MultipleExits,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntry        => f.write_str("missing_entry"),
            Self::DuplicateEntry      => f.write_str("duplicate_entry"),
            Self::MissingExit         => f.write_str("missing_exit"),
            Self::DuplicateNodeId     => f.write_str("duplicate_node_id"),
            Self::DanglingEdge        => f.write_str("dangling_edge"),
            Self::Cycle               => f.write_str("cycle"),
            Self::Unreachable         => f.write_str("unreachable"),
            Self::Config { field }    => write!(f, "config.{field}"),
            Self::ResponseHasOutgoing => f.write_str("response_has_outgoing"),
            Self::Branching           => f.write_str("branching"),
            Self::MultipleExits       => f.write_str("multiple_exits"),
        }
    }
}

/// A single validator finding, scoped to the nodes and edges involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Offending node ids; for a cycle, in cycle order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
    /// Offending edge ids (see [`crate::Edge::id`]).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            nodes: Vec::new(),
            edges: Vec::new(),
            message: message.into(),
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn with_nodes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_edge(mut self, id: impl Into<String>) -> Self {
        self.edges.push(id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}[{}]: {}", self.code, self.message)?;
        if !self.nodes.is_empty() {
            write!(f, " (nodes: {})", self.nodes.join(", "))?;
        }
        if !self.edges.is_empty() {
            write!(f, " (edges: {})", self.edges.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_code_and_scope() {
        let d = Diagnostic::error(
            DiagnosticCode::Config { field: "schema".into() },
            "missing required field 'schema'",
        )
        .with_nodes(["check"]);
        assert_eq!(
            d.to_string(),
            "error[config.schema]: missing required field 'schema' (nodes: check)"
        );

        let w = Diagnostic::warning(DiagnosticCode::Branching, "fan-out").with_edge("a->b");
        assert!(!w.is_error());
        assert_eq!(w.to_string(), "warning[branching]: fan-out (edges: a->b)");
    }
}
