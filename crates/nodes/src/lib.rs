//! `nodes` crate — the closed vocabulary of flow nodes.
//!
//! Every node on the canvas carries one [`NodeConfig`] variant.  The variant
//! *is* the node's kind, so a kind/config mismatch cannot be represented.
//! The per-kind required-field contract lives in [`contract`]; the engine's
//! validator turns its [`ConfigIssue`]s into node-scoped diagnostics.

pub mod config;
pub mod contract;
pub mod error;

pub use config::{
    DatabaseConfig, FieldType, HttpMethod, NodeConfig, NodeKind, ResponseConfig, ResponseFormat,
    TransformConfig, TriggerConfig, ValidateConfig,
};
pub use error::ConfigIssue;
