//! Node kinds and their configuration payloads.
//!
//! Config fields are optional at the type level so that a half-edited node
//! (dropped on the canvas, form not filled in yet) is still a valid value.
//! Whether a config is *complete* is decided by [`crate::contract`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The closed set of node kinds a flow can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Database,
    Transform,
    Validate,
    Response,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trigger => "trigger",
            Self::Database => "database",
            Self::Transform => "transform",
            Self::Validate => "validate",
            Self::Response => "response",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// HTTP verbs a generated endpoint can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a JSON body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET"    => Ok(Self::Get),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other    => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// Entry point of a flow: the route the generated handler is mounted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// A query against the database client available to generated handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// User-authored code applied to the previous step's output.
///
/// `code` is the *body* of a function taking `input`; it must `return` the
/// transformed value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Type descriptor for a single field of a Validate node's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Email,
    Array,
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String  => "string",
            Self::Number  => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Email   => "email",
            Self::Array   => "array",
            Self::Object  => "object",
        };
        f.write_str(name)
    }
}

/// Shape assertion on the previous step's output.
///
/// A `BTreeMap` keeps field order stable, which the generator relies on for
/// byte-identical output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<BTreeMap<String, FieldType>>,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Serialization format of the HTTP response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
    Xml,
}

/// Exit point of a flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ResponseFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ResponseConfig {
    pub const DEFAULT_STATUS: u16 = 200;

    pub fn status(&self) -> u16 {
        self.status_code.unwrap_or(Self::DEFAULT_STATUS)
    }
}

// ---------------------------------------------------------------------------
// NodeConfig
// ---------------------------------------------------------------------------

/// Per-kind configuration, tagged by `kind` on the wire:
///
/// ```json
/// { "kind": "database", "table": "users", "limit": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeConfig {
    Trigger(TriggerConfig),
    Database(DatabaseConfig),
    Transform(TransformConfig),
    Validate(ValidateConfig),
    Response(ResponseConfig),
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Trigger(_)   => NodeKind::Trigger,
            Self::Database(_)  => NodeKind::Database,
            Self::Transform(_) => NodeKind::Transform,
            Self::Validate(_)  => NodeKind::Validate,
            Self::Response(_)  => NodeKind::Response,
        }
    }

    /// An unfilled config of the given kind, as the palette inserts it.
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Trigger   => Self::Trigger(TriggerConfig::default()),
            NodeKind::Database  => Self::Database(DatabaseConfig::default()),
            NodeKind::Transform => Self::Transform(TransformConfig::default()),
            NodeKind::Validate  => Self::Validate(ValidateConfig::default()),
            NodeKind::Response  => Self::Response(ResponseConfig::default()),
        }
    }

    pub fn trigger(method: HttpMethod, path: impl Into<String>) -> Self {
        Self::Trigger(TriggerConfig {
            method: Some(method),
            path: Some(path.into()),
        })
    }

    pub fn database(table: impl Into<String>) -> Self {
        Self::Database(DatabaseConfig {
            table: Some(table.into()),
            ..Default::default()
        })
    }

    pub fn transform(code: impl Into<String>) -> Self {
        Self::Transform(TransformConfig { code: Some(code.into()) })
    }

    pub fn validate<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldType)>,
        K: Into<String>,
    {
        Self::Validate(ValidateConfig {
            schema: Some(fields.into_iter().map(|(k, t)| (k.into(), t)).collect()),
        })
    }

    pub fn response(format: ResponseFormat) -> Self {
        Self::Response(ResponseConfig {
            format: Some(format),
            status_code: None,
        })
    }
}
