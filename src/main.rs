//! Command-line interface for cfgwalk

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use cfgwalk::converters::{create_converter, ConverterConfig, ConverterType};
#[cfg(feature = "cli")]
use cfgwalk::coverage::Coverage;
#[cfg(feature = "cli")]
use cfgwalk::limits::Limits;
#[cfg(feature = "cli")]
use cfgwalk::loaders::YinLoader;
#[cfg(feature = "cli")]
use cfgwalk::schema::{NodeKind, SchemaTree};
#[cfg(feature = "cli")]
use cfgwalk::settings::{Overrides, WalkSettings};
#[cfg(feature = "cli")]
use cfgwalk::walker::{ValueDomainSynthesizer, Walker};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "cfgwalk")]
#[command(author, version, about = "Constraint-driven configuration-space walker", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    /// One `path = value` line per assignment, `--` after each row
    Text,
    /// One JSON payload per row
    Json,
    /// One XML payload per row
    Xml,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Walk the configuration space and print one row per round
    Walk {
        /// YIN module files
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Override maps (JSON)
        #[arg(short, long)]
        overrides: Option<PathBuf>,

        /// Restrict the walk to these subtrees (schema paths)
        #[arg(short, long = "root")]
        roots: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Render payloads without indentation
        #[arg(long)]
        compact: bool,

        /// Stop with an error after this many rounds
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Write a coverage report (JSON) to this file
        #[arg(long)]
        coverage: Option<PathBuf>,

        /// Print walk statistics to stderr when done
        #[arg(long)]
        stats: bool,
    },

    /// Show the value domain synthesized for each leaf
    Domains {
        /// YIN module files
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Override maps (JSON)
        #[arg(short, long)]
        overrides: Option<PathBuf>,

        /// Only these leaves (schema or data paths)
        #[arg(short, long = "leaf")]
        leaves: Vec<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Inspect a schema and display its structure
    Inspect {
        /// YIN module files
        #[arg(value_name = "SCHEMA", required = true)]
        schemas: Vec<PathBuf>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Walk {
            schemas,
            overrides,
            roots,
            format,
            compact,
            max_rounds,
            coverage,
            stats,
        } => cmd_walk(schemas, overrides, roots, format, compact, max_rounds, coverage, stats),
        Commands::Domains {
            schemas,
            overrides,
            leaves,
            json,
        } => cmd_domains(schemas, overrides, leaves, json),
        Commands::Inspect { schemas, json } => cmd_inspect(schemas, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = if verbose { "cfgwalk=debug" } else { "cfgwalk=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(feature = "cli")]
fn load_schema(schemas: &[PathBuf]) -> Result<SchemaTree, Box<dyn std::error::Error>> {
    let mut loader = YinLoader::new();
    for path in schemas {
        loader.add_file(path)?;
    }
    Ok(loader.load()?)
}

#[cfg(feature = "cli")]
fn load_overrides(path: Option<PathBuf>) -> Result<Overrides, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Overrides::from_json_file(path)?),
        None => Ok(Overrides::new()),
    }
}

#[cfg(feature = "cli")]
#[allow(clippy::too_many_arguments)]
fn cmd_walk(
    schemas: Vec<PathBuf>,
    overrides: Option<PathBuf>,
    roots: Vec<String>,
    format: OutputFormat,
    compact: bool,
    max_rounds: Option<usize>,
    coverage_path: Option<PathBuf>,
    show_stats: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = load_schema(&schemas)?;
    let overrides = load_overrides(overrides)?;

    let mut limits = Limits::default();
    if let Some(max) = max_rounds {
        limits.max_rounds = max;
    }
    let mut settings = WalkSettings::new().with_limits(limits);
    for root in roots {
        settings = settings.with_root(root);
    }

    let config = ConverterConfig::new().with_indent(if compact { 0 } else { 2 });
    let converter = match format {
        OutputFormat::Text => None,
        OutputFormat::Json => Some(create_converter(ConverterType::Json, config)),
        OutputFormat::Xml => Some(create_converter(ConverterType::Xml, config)),
    };

    let mut coverage = Coverage::new();
    let mut walker = Walker::new(&tree, &overrides, settings);
    while let Some(row) = walker.step()? {
        match &converter {
            Some(converter) => println!("{}", converter.convert(&tree, &row)?),
            None => {
                for assignment in &row.assignments {
                    println!("{}", assignment);
                }
                println!("--");
            }
        }
        coverage.record_row(&row);
    }

    let stats = walker.stats();
    coverage.record_session(&stats);
    if show_stats {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }
    if let Some(path) = coverage_path {
        fs::write(path, coverage.report().to_json()?)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_domains(
    schemas: Vec<PathBuf>,
    overrides: Option<PathBuf>,
    leaves: Vec<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Map, Value};

    let tree = load_schema(&schemas)?;
    let overrides = load_overrides(overrides)?;
    let synthesizer = ValueDomainSynthesizer::new(&tree, &overrides);

    let selected: Vec<_> = if leaves.is_empty() {
        tree.leaves()
    } else {
        leaves
            .iter()
            .map(|p| tree.find(p).ok_or_else(|| format!("Leaf '{}' not found in schema", p)))
            .collect::<Result<_, _>>()?
    };

    let mut output = Map::new();
    for id in selected {
        let node = tree.node(id);
        let values = synthesizer.synthesize(id)?.values(0);
        if json_output {
            output.insert(node.path.clone(), json!(values));
        } else {
            println!("{}", node.path);
            for value in values {
                println!("  {}", value);
            }
        }
    }
    if json_output {
        println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_inspect(schemas: Vec<PathBuf>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    use serde_json::{json, Value};

    let tree = load_schema(&schemas)?;
    let count = |kind: NodeKind| tree.nodes().filter(|n| n.kind == kind).count();

    if json_output {
        let nodes: Vec<Value> = tree
            .nodes()
            .map(|n| {
                json!({
                    "path": n.path,
                    "kind": n.kind.to_string(),
                    "type": n.type_spec.as_ref().map(|t| t.to_string()),
                    "config": n.config,
                    "when": n.when,
                    "must": n.must,
                })
            })
            .collect();
        let output = json!({
            "modules": tree.modules(),
            "statistics": {
                "nodes": tree.len(),
                "leaves": tree.leaves().len(),
                "choices": count(NodeKind::Choice),
                "lists": count(NodeKind::List),
                "typedefs": tree.typedefs().count(),
            },
            "nodes": nodes,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("cfgwalk v{}", cfgwalk::VERSION);
    println!();
    println!("Modules: {}", tree.modules().join(", "));
    println!();
    println!("Statistics:");
    println!("  Nodes: {}", tree.len());
    println!("  Leaves: {}", tree.leaves().len());
    println!("  Choices: {}", count(NodeKind::Choice));
    println!("  Lists: {}", count(NodeKind::List));
    println!("  Typedefs: {}", tree.typedefs().count());
    println!();
    println!("=== Tree ===");
    for id in tree.depth_first(tree.roots()) {
        let node = tree.node(id);
        let indent = "  ".repeat(tree.depth(id) + 1);
        match &node.type_spec {
            Some(spec) => println!("{}{} {} : {}", indent, node.kind, node.name, spec),
            None => println!("{}{} {}", indent, node.kind, node.name),
        }
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
