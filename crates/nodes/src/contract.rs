//! Required-field contract for every node kind.
//!
//! Rules enforced:
//! - Trigger:   `method` and `path` required; `path` must start with `/`.
//! - Database:  `table` required; `limit` > 0 and `filter` non-blank when given.
//! - Transform: `code` required and non-blank.
//! - Validate:  `schema` required, with at least one named field.
//! - Response:  `format` required; `statusCode` within 100..=599 when given.

use crate::config::{
    DatabaseConfig, NodeConfig, NodeKind, ResponseConfig, TransformConfig, TriggerConfig,
    ValidateConfig,
};
use crate::ConfigIssue;

/// Fields that must be present (and non-empty) for each kind.
pub fn required_fields(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Trigger   => &["method", "path"],
        NodeKind::Database  => &["table"],
        NodeKind::Transform => &["code"],
        NodeKind::Validate  => &["schema"],
        NodeKind::Response  => &["format"],
    }
}

impl NodeConfig {
    /// Check this config against its kind's contract.
    ///
    /// Returns every issue found, in field order; an empty vector means the
    /// node is complete and can be lowered by the generator.
    pub fn check_contract(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        match self {
            Self::Trigger(cfg)   => check_trigger(cfg, &mut issues),
            Self::Database(cfg)  => check_database(cfg, &mut issues),
            Self::Transform(cfg) => check_transform(cfg, &mut issues),
            Self::Validate(cfg)  => check_validate(cfg, &mut issues),
            Self::Response(cfg)  => check_response(cfg, &mut issues),
        }
        issues
    }

    pub fn is_complete(&self) -> bool {
        self.check_contract().is_empty()
    }
}

fn required_text(field: &'static str, value: Option<&str>, issues: &mut Vec<ConfigIssue>) {
    match value {
        None => issues.push(ConfigIssue::Missing { field }),
        Some(v) if v.trim().is_empty() => issues.push(ConfigIssue::Empty { field }),
        Some(_) => {}
    }
}

fn check_trigger(cfg: &TriggerConfig, issues: &mut Vec<ConfigIssue>) {
    if cfg.method.is_none() {
        issues.push(ConfigIssue::Missing { field: "method" });
    }
    required_text("path", cfg.path.as_deref(), issues);
    if let Some(path) = cfg.path.as_deref() {
        if !path.trim().is_empty() && !path.starts_with('/') {
            issues.push(ConfigIssue::Invalid {
                field: "path",
                reason: format!("'{path}' must start with '/'"),
            });
        }
    }
}

fn check_database(cfg: &DatabaseConfig, issues: &mut Vec<ConfigIssue>) {
    required_text("table", cfg.table.as_deref(), issues);
    if let Some(filter) = cfg.filter.as_deref() {
        if filter.trim().is_empty() {
            issues.push(ConfigIssue::Empty { field: "filter" });
        }
    }
    if cfg.limit == Some(0) {
        issues.push(ConfigIssue::Invalid {
            field: "limit",
            reason: "must be greater than zero".into(),
        });
    }
}

fn check_transform(cfg: &TransformConfig, issues: &mut Vec<ConfigIssue>) {
    required_text("code", cfg.code.as_deref(), issues);
}

fn check_validate(cfg: &ValidateConfig, issues: &mut Vec<ConfigIssue>) {
    match &cfg.schema {
        None => issues.push(ConfigIssue::Missing { field: "schema" }),
        Some(schema) if schema.is_empty() => issues.push(ConfigIssue::Empty { field: "schema" }),
        Some(schema) => {
            if schema.keys().any(|name| name.trim().is_empty()) {
                issues.push(ConfigIssue::Invalid {
                    field: "schema",
                    reason: "field names must not be blank".into(),
                });
            }
        }
    }
}

fn check_response(cfg: &ResponseConfig, issues: &mut Vec<ConfigIssue>) {
    if cfg.format.is_none() {
        issues.push(ConfigIssue::Missing { field: "format" });
    }
    if let Some(code) = cfg.status_code {
        if !(100..=599).contains(&code) {
            issues.push(ConfigIssue::Invalid {
                field: "statusCode",
                reason: format!("{code} is not an HTTP status code"),
            });
        }
    }
}
