//! Lowering of a scheduled flow to a TypeScript route handler.
//!
//! The generator trusts its input: it must only be handed the output of
//! [`crate::schedule`] for a graph that passed [`crate::validate`].  Anything
//! else is a defect and surfaces as a [`GenerationError`].

mod rules;
mod writer;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use nodes::{HttpMethod, NodeKind};

use crate::models::{sha256_hex, Node};
use crate::GenerationError;
use writer::{comment_text, ImportSet, SourceWriter};

/// Module paths and formatting used by the generated handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Provides `NextRequest` and `NextResponse`.
    pub server_module: String,
    /// Exports the database client used by Database steps.
    pub db_module: String,
    pub db_binding: String,
    /// Exports `z`; imported only when a Validate step is emitted.
    pub validation_module: String,
    /// Exports `XMLBuilder`; imported only when an XML response is emitted.
    pub xml_module: String,
    pub indent: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            server_module: "next/server".into(),
            db_module: "@/lib/db".into(),
            db_binding: "db".into(),
            validation_module: "zod".into(),
            xml_module: "fast-xml-parser".into(),
            indent: "  ".into(),
        }
    }
}

/// Generated handler source plus the metadata needed to deploy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub method: HttpMethod,
    pub path: String,
    pub source: String,
    /// Module specifiers the source imports from.
    pub imports: BTreeSet<String>,
    /// Ids of the nodes that contributed code, in emission order.
    pub steps: Vec<String>,
}

impl Artifact {
    /// SHA-256 of the source text, lowercase hex.
    pub fn source_hash(&self) -> String {
        sha256_hex(self.source.as_bytes())
    }
}

/// Lower `order` into a route handler.
///
/// The first Response ends the handler; scheduled nodes after it are not
/// emitted and contribute no imports.
#[instrument(skip_all, fields(nodes = order.len()))]
pub fn generate(order: &[&Node], config: &GeneratorConfig) -> Result<Artifact, GenerationError> {
    let (first, rest) = order.split_first().ok_or(GenerationError::EmptySchedule)?;
    let entry = rules::emit_entry(first)?;

    let mut imports = ImportSet::default();
    imports.add(&config.server_module, "NextRequest");
    imports.add(&config.server_module, "NextResponse");

    let mut steps = vec![first.id.clone()];
    let mut body = Vec::with_capacity(rest.len());
    let mut terminated = false;

    for (position, node) in rest.iter().enumerate() {
        if terminated {
            if node.kind() == NodeKind::Trigger {
                return Err(GenerationError::UnexpectedTrigger(node.id.clone()));
            }
            debug!(node = %node.id, "not emitted: follows the first response");
            continue;
        }

        let output = format!("step{}", position + 1);
        let emission = rules::emit(node, &output, config, &mut imports)?;
        debug!(node = %node.id, kind = %node.kind(), %output, "emitted step");

        terminated = emission.terminates;
        steps.push(node.id.clone());
        body.push((*node, emission.block));
    }

    if !terminated {
        return Err(GenerationError::NoResponse);
    }

    let validates = imports.contains(&config.validation_module);

    let mut w = SourceWriter::new(&config.indent);
    w.line("// Generated by flowsmith. Do not edit.");
    w.line(&format!("// Route: {} {}", entry.method, comment_text(&entry.path)));
    let scheduled: Vec<&str> = order.iter().map(|n| n.id.as_str()).collect();
    w.line(&format!("// Steps: {}", comment_text(&scheduled.join(" -> "))));
    w.blank();
    for import in imports.render() {
        w.line(&import);
    }
    w.blank();

    w.open(&format!("export async function {}(request: NextRequest) {{", entry.method));
    w.open("try {");
    w.block(&entry.prologue);
    for (node, block) in &body {
        w.blank();
        w.line(&step_comment(node));
        w.block(block);
    }
    w.close("} catch (error) {");
    if validates {
        w.open("if (error instanceof z.ZodError) {");
        w.line(r#"return NextResponse.json({ error: "validation failed", issues: error.issues }, { status: 400 });"#);
        w.close("}");
    }
    w.line("const message = error instanceof Error ? error.message : String(error);");
    w.line("return NextResponse.json({ error: message }, { status: 500 });");
    w.close("}");
    w.close("}");

    let artifact = Artifact {
        method: entry.method,
        path: entry.path,
        source: w.finish(),
        imports: imports.modules(),
        steps,
    };

    info!(
        method = %artifact.method,
        path = %artifact.path,
        steps = artifact.steps.len(),
        "generated handler"
    );

    Ok(artifact)
}

/// `// [id] label (kind)`, or `// [id] (kind)` for an unlabelled node.
fn step_comment(node: &Node) -> String {
    let label = node.label.trim();
    if label.is_empty() {
        format!("// [{}] ({})", comment_text(&node.id), node.kind())
    } else {
        format!("// [{}] {} ({})", comment_text(&node.id), comment_text(label), node.kind())
    }
}
