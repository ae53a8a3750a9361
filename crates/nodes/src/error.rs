//! Config contract violations.

use thiserror::Error;

/// A single way in which a node's config fails its kind's contract.
///
/// These are reported, never raised: the validator collects every issue of
/// every node and turns each into a diagnostic scoped to that node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    /// A required field is absent.
    #[error("missing required field '{field}'")]
    Missing { field: &'static str },

    /// A required field is present but empty (blank string, empty map).
    #[error("required field '{field}' is empty")]
    Empty { field: &'static str },

    /// A field is present but its value is out of range or malformed.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigIssue {
    /// Name of the offending config field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::Empty { field } | Self::Invalid { field, .. } => *field,
        }
    }
}
