//! One emission rule per node kind.
//!
//! Each rule reads the previous step's output from `previousResult`, binds
//! its own output to the step variable it is given, and rebinds
//! `previousResult` to it.  Response rules end the handler instead.

use nodes::{
    DatabaseConfig, FieldType, HttpMethod, NodeConfig, ResponseConfig, ResponseFormat,
    TransformConfig, ValidateConfig,
};

use super::writer::{ts_string, Block, ImportSet};
use super::GeneratorConfig;
use crate::models::Node;
use crate::GenerationError;

/// Conventional name of the value threaded through the pipeline.
pub(crate) const PREVIOUS_RESULT: &str = "previousResult";

/// Handler metadata contributed by the Trigger.
pub(crate) struct Entry {
    pub method: HttpMethod,
    pub path: String,
    /// Binds the initial `previousResult` from the request.
    pub prologue: Block,
}

/// Output of a non-trigger rule.
pub(crate) struct Emission {
    pub block: Block,
    /// The block returns from the handler; nothing after it can run.
    pub terminates: bool,
}

pub(crate) fn emit_entry(node: &Node) -> Result<Entry, GenerationError> {
    let NodeConfig::Trigger(cfg) = &node.config else {
        return Err(GenerationError::TriggerNotFirst(node.id.clone()));
    };
    let method = cfg.method.ok_or_else(|| incomplete(node, "method"))?;
    let path = cfg.path.clone().ok_or_else(|| incomplete(node, "path"))?;

    let input = if method.has_body() {
        "await request.json()"
    } else {
        "Object.fromEntries(request.nextUrl.searchParams)"
    };

    let mut prologue = Block::default();
    prologue.line(format!("let {PREVIOUS_RESULT}: unknown = {input};"));

    Ok(Entry { method, path, prologue })
}

pub(crate) fn emit(
    node: &Node,
    output: &str,
    config: &GeneratorConfig,
    imports: &mut ImportSet,
) -> Result<Emission, GenerationError> {
    match &node.config {
        NodeConfig::Trigger(_)     => Err(GenerationError::UnexpectedTrigger(node.id.clone())),
        NodeConfig::Database(cfg)  => database(node, cfg, output, config, imports),
        NodeConfig::Transform(cfg) => transform(node, cfg, output),
        NodeConfig::Validate(cfg)  => validate(node, cfg, output, config, imports),
        NodeConfig::Response(cfg)  => response(node, cfg, output, config, imports),
    }
}

fn incomplete(node: &Node, field: &'static str) -> GenerationError {
    GenerationError::IncompleteConfig {
        node_id: node.id.clone(),
        field,
    }
}

fn pass_on(block: &mut Block, output: &str) {
    block.line(format!("{PREVIOUS_RESULT} = {output};"));
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

fn database(
    node: &Node,
    cfg: &DatabaseConfig,
    output: &str,
    config: &GeneratorConfig,
    imports: &mut ImportSet,
) -> Result<Emission, GenerationError> {
    let table = cfg.table.as_deref().ok_or_else(|| incomplete(node, "table"))?;
    imports.add(&config.db_module, &config.db_binding);

    let mut block = Block::default();
    block.line(format!("const {output} = await {}.query({{", config.db_binding));
    block.indented(1, format!("table: {},", ts_string(table)));
    if let Some(filter) = cfg.filter.as_deref() {
        block.indented(1, format!("filter: {},", ts_string(filter)));
    }
    if let Some(limit) = cfg.limit {
        block.indented(1, format!("limit: {limit},"));
    }
    block.indented(1, format!("input: {PREVIOUS_RESULT},"));
    block.line("});");
    pass_on(&mut block, output);

    Ok(Emission { block, terminates: false })
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

fn transform(node: &Node, cfg: &TransformConfig, output: &str) -> Result<Emission, GenerationError> {
    let code = cfg.code.as_deref().ok_or_else(|| incomplete(node, "code"))?;

    let mut block = Block::default();
    block.line(format!("const {output} = await (async (input: any) => {{"));
    for line in code.trim_matches('\n').lines() {
        block.indented(1, line.trim_end());
    }
    block.line(format!("}})({PREVIOUS_RESULT});"));
    pass_on(&mut block, output);

    Ok(Emission { block, terminates: false })
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

fn zod_type(field: FieldType) -> &'static str {
    match field {
        FieldType::String  => "z.string()",
        FieldType::Number  => "z.number()",
        FieldType::Integer => "z.number().int()",
        FieldType::Boolean => "z.boolean()",
        FieldType::Email   => "z.string().email()",
        FieldType::Array   => "z.array(z.unknown())",
        FieldType::Object  => "z.record(z.unknown())",
    }
}

fn validate(
    node: &Node,
    cfg: &ValidateConfig,
    output: &str,
    config: &GeneratorConfig,
    imports: &mut ImportSet,
) -> Result<Emission, GenerationError> {
    let schema = cfg
        .schema
        .as_ref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| incomplete(node, "schema"))?;
    imports.add(&config.validation_module, "z");

    let mut block = Block::default();
    block.line(format!("const {output} = z.object({{"));
    for (field, ty) in schema {
        block.indented(1, format!("{}: {},", ts_string(field), zod_type(*ty)));
    }
    block.line(format!("}}).parse({PREVIOUS_RESULT});"));
    pass_on(&mut block, output);

    Ok(Emission { block, terminates: false })
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

fn response(
    node: &Node,
    cfg: &ResponseConfig,
    output: &str,
    config: &GeneratorConfig,
    imports: &mut ImportSet,
) -> Result<Emission, GenerationError> {
    let format = cfg.format.ok_or_else(|| incomplete(node, "format"))?;
    let status = cfg.status();

    let mut block = Block::default();
    match format {
        ResponseFormat::Json => {
            block.line(format!(
                "return NextResponse.json({PREVIOUS_RESULT}, {{ status: {status} }});"
            ));
        }
        ResponseFormat::Xml => {
            imports.add(&config.xml_module, "XMLBuilder");
            block.line(format!(
                "const {output} = new XMLBuilder().build({{ response: {PREVIOUS_RESULT} }});"
            ));
            block.line(format!("return new NextResponse({output}, {{"));
            block.indented(1, format!("status: {status},"));
            block.indented(1, r#"headers: { "Content-Type": "application/xml" },"#);
            block.line("});");
        }
    }

    Ok(Emission { block, terminates: true })
}
