//! `flowsmith` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — check a flow file and print its diagnostics.
//! - `schedule` — print the execution order of a flow.
//! - `generate` — compile a flow to a TypeScript route handler.
//! - `deploy`   — compile and publish a flow into an output directory.
//! - `graph`    — render a flow as a Mermaid flowchart.
//! - `save` / `load` / `list` — manage flows in a JSON directory store.

mod publish;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use engine::{
    compile, persistence, schedule, validate, CompileError, Deployer, Diagnostic, GeneratorConfig,
    Graph, Packager, PackagerConfig,
};
use store::{FlowId, FlowStore, JsonDirStore};

use publish::DirectoryPublisher;

#[derive(Parser)]
#[command(
    name = "flowsmith",
    about = "Compile visual flows into HTTP route handlers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a flow JSON file.
    Validate {
        /// Path to the flow JSON file.
        path: PathBuf,
    },
    /// Print the order in which a flow's nodes run.
    Schedule { path: PathBuf },
    /// Generate the route handler for a flow.
    Generate {
        path: PathBuf,

        /// Write the source here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the artifact (source, imports, steps) as JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Compile a flow and publish it as `<out>/<endpointId>/route.ts`.
    Deploy {
        path: PathBuf,

        #[arg(short, long, default_value = "deployments")]
        out: PathBuf,

        /// Prefix of the URLs reported for published endpoints.
        #[arg(long, default_value = "http://localhost:3000/api")]
        base_url: String,

        #[arg(long, default_value = "ep_")]
        id_prefix: String,

        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Render a flow as a Mermaid flowchart.
    Graph { path: PathBuf },
    /// Save a flow file into the store.
    Save {
        path: PathBuf,

        /// Name to save the flow under (defaults to the file stem).
        #[arg(long)]
        name: Option<String>,

        #[arg(long, env = "FLOWSMITH_STORE", default_value = ".flowsmith")]
        store: PathBuf,
    },
    /// Print a stored flow as JSON.
    Load {
        id: FlowId,

        #[arg(long, env = "FLOWSMITH_STORE", default_value = ".flowsmith")]
        store: PathBuf,
    },
    /// List stored flows, newest first.
    List {
        #[arg(long, env = "FLOWSMITH_STORE", default_value = ".flowsmith")]
        store: PathBuf,
    },
}

/// Overrides for the generated handler's imports and layout.
#[derive(Args)]
struct GeneratorArgs {
    /// Module exporting the database client.
    #[arg(long, env = "FLOWSMITH_DB_MODULE")]
    db_module: Option<String>,

    /// Name the database client is exported under.
    #[arg(long)]
    db_binding: Option<String>,

    /// Spaces per indentation level.
    #[arg(long)]
    indent: Option<usize>,
}

impl GeneratorArgs {
    fn into_config(self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        if let Some(module) = self.db_module {
            config.db_module = module;
        }
        if let Some(binding) = self.db_binding {
            config.db_binding = binding;
        }
        if let Some(width) = self.indent {
            config.indent = " ".repeat(width);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Validate { path } => {
            let graph = read_flow(&path).await?;
            match validate(&graph) {
                Ok(valid) => {
                    print_diagnostics(valid.warnings());
                    println!("flow is valid (trigger: {})", valid.trigger().id);
                }
                Err(diagnostics) => {
                    print_diagnostics(&diagnostics);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Schedule { path } => {
            let graph = read_flow(&path).await?;
            let valid = match validate(&graph) {
                Ok(valid) => valid,
                Err(diagnostics) => {
                    print_diagnostics(&diagnostics);
                    return Ok(ExitCode::FAILURE);
                }
            };
            for (position, node) in schedule(&valid).iter().enumerate() {
                println!("{position:>3}  {:<10} {}", node.kind(), node.id);
            }
        }
        Command::Generate { path, output, json, generator } => {
            let graph = read_flow(&path).await?;
            let Some(artifact) = compile_or_report(&graph, &generator.into_config())? else {
                return Ok(ExitCode::FAILURE);
            };

            let text = if json {
                serde_json::to_string_pretty(&artifact)?
            } else {
                artifact.source
            };
            match output {
                Some(out) => {
                    tokio::fs::write(&out, text)
                        .await
                        .with_context(|| format!("cannot write {}", out.display()))?;
                    info!("wrote {}", out.display());
                }
                None => print!("{text}"),
            }
        }
        Command::Deploy { path, out, base_url, id_prefix, generator } => {
            let graph = read_flow(&path).await?;
            let Some(artifact) = compile_or_report(&graph, &generator.into_config())? else {
                return Ok(ExitCode::FAILURE);
            };

            let packager = Packager::new(PackagerConfig {
                id_prefix,
                ..PackagerConfig::default()
            });
            let deployer = Deployer::new(DirectoryPublisher::new(&out, base_url), packager);
            let deployment = deployer
                .deploy(&artifact, &graph)
                .await
                .context("deployment failed")?;

            println!("{} {}", deployment.manifest.endpoint_id, deployment.url);
        }
        Command::Graph { path } => {
            let graph = read_flow(&path).await?;
            print!("{}", graph.to_mermaid());
        }
        Command::Save { path, name, store } => {
            let graph = read_flow(&path).await?;
            let name = match name {
                Some(name) => name,
                None => path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "flow".to_string()),
            };
            let store = open_store(&store).await?;
            let id = persistence::save_flow(&store, &name, &graph).await?;
            println!("{id}");
        }
        Command::Load { id, store } => {
            let store = open_store(&store).await?;
            let graph = persistence::load_flow(&store, id)
                .await
                .with_context(|| format!("cannot load flow {id}"))?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Command::List { store } => {
            let store = open_store(&store).await?;
            for row in store.list_flows().await? {
                println!("{}  {}  {}", row.id, row.created_at.to_rfc3339(), row.name);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn read_flow(path: &Path) -> Result<Graph> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid flow JSON in {}", path.display()))
}

async fn open_store(root: &Path) -> Result<JsonDirStore> {
    JsonDirStore::open(root)
        .await
        .with_context(|| format!("cannot open store at {}", root.display()))
}

/// `None` when the flow is invalid; its diagnostics have been printed.
fn compile_or_report(graph: &Graph, config: &GeneratorConfig) -> Result<Option<engine::Artifact>> {
    match compile(graph, config) {
        Ok(artifact) => Ok(Some(artifact)),
        Err(CompileError::Invalid(diagnostics)) => {
            print_diagnostics(&diagnostics);
            Ok(None)
        }
        Err(e) => Err(e).context("code generation failed"),
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}
