//! fosgraph CLI: ingest exporter rows into a snapshot and query it.
//!
//! Usage:
//!   fosgraph ingest --nodes nodes.csv --full-names fullnames.csv --edges edges.csv
//!   fosgraph validate [--all]
//!   fosgraph path <id>
//!   fosgraph classify <venue> [--level L3] [--hops 2]
//!   fosgraph export [--jsonl] [--output taxonomy.json]
//!
//! Every command reads the snapshot given by `--snapshot` (default
//! `~/.local/share/fosgraph/graph.json`); `ingest` and `infer --apply` write it back.

use clap::{ArgAction, Parser, Subcommand};
use fosgraph::query::{annotation_coverage, infer_assignments, venues_in_fos};
use fosgraph::taxonomy::{write_json, write_jsonl};
use fosgraph::{
    classify_by_citation, keyword_neighborhood, resolve_path, validate, validate_all, EdgeType, EngineConfig,
    FosGraph, GraphStore, IngestSession, JsonStore, Level, NodeId, OpenStore, Role, TaxonomyExporter,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "fosgraph",
    version,
    about = "Multi-relational graph engine for the Field-of-Science venue taxonomy"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to the graph snapshot
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge node, full-name and edge rows into the snapshot
    Ingest {
        /// Node rows (id|name|roles or id|name|L4_name|L5_name|roles)
        #[arg(long)]
        nodes: Vec<PathBuf>,
        /// Full-name rows (id|full_name)
        #[arg(long = "full-names")]
        full_names: Vec<PathBuf>,
        /// Edge rows (source|target|type|weight)
        #[arg(long)]
        edges: Vec<PathBuf>,
    },
    /// Check the FoS hierarchy
    Validate {
        /// Check every node, not only those changed since the last clean run
        #[arg(long)]
        all: bool,
    },
    /// Resolve the FoS path of a node
    Path {
        id: String,
    },
    /// Classify a venue from its citation neighbors
    Classify {
        venue: String,
        #[arg(long)]
        level: Option<Level>,
        #[arg(long)]
        hops: Option<usize>,
        #[arg(long)]
        top: Option<usize>,
        /// Propagate even if the venue has its own assignment
        #[arg(long)]
        overwrite: bool,
        /// Use deeper assignments rolled up through the hierarchy
        #[arg(long = "roll-up")]
        roll_up: bool,
    },
    /// Infer assignments for every unassigned venue
    Infer {
        #[arg(long)]
        level: Option<Level>,
        /// Ingest the inferred edges and save the snapshot
        #[arg(long)]
        apply: bool,
    },
    /// List co-occurring keywords
    Neighbors {
        id: String,
        #[arg(long)]
        top: Option<usize>,
    },
    /// List venues assigned to a FoS node
    Venues {
        id: String,
    },
    /// Export the taxonomy
    Export {
        /// Write JSON lines instead of one array
        #[arg(long)]
        jsonl: bool,
        /// Output file (stdout if absent)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Share of nodes with a role that carry an edge type
    Coverage {
        #[arg(long, default_value = "venue", value_parser = parse_role)]
        role: Role,
        #[arg(long = "edge-type", default_value = "in_L4")]
        edge_type: EdgeType,
    },
}

fn parse_role(token: &str) -> Result<Role, String> {
    Role::from_token(token).ok_or_else(|| format!("unknown role '{}'", token))
}

/// Get the default snapshot path (~/.local/share/fosgraph/graph.json)
fn default_snapshot_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("fosgraph").join("graph.json")
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging already initialized");
    }
}

fn open_store(path: Option<PathBuf>) -> Result<JsonStore, String> {
    let path = path.unwrap_or_else(default_snapshot_path);
    JsonStore::open(&path).map_err(|e| format!("Failed to open snapshot {}: {}", path.display(), e))
}

fn load_graph(store: &JsonStore) -> Result<FosGraph, String> {
    if !store.exists() {
        return Ok(FosGraph::new());
    }
    store.load().map_err(|e| format!("Failed to load snapshot: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn open_rows(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("cannot open '{}': {}", path.display(), e))
}

fn cmd_ingest(
    graph: &FosGraph,
    store: &JsonStore,
    config: &EngineConfig,
    nodes: &[PathBuf],
    full_names: &[PathBuf],
    edges: &[PathBuf],
) -> i32 {
    let mut session = IngestSession::with_format(graph, config.ingest.row_format());
    for path in nodes {
        match open_rows(path) {
            Ok(reader) => {
                session.ingest_node_rows(reader);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    for path in full_names {
        match open_rows(path) {
            Ok(reader) => {
                session.ingest_full_name_rows(reader);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }
    for path in edges {
        match open_rows(path) {
            Ok(reader) => {
                session.ingest_edge_rows(reader);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    let report = session.finalize();
    if let Err(e) = store.save(graph) {
        eprintln!("Error: failed to save snapshot: {}", e);
        return 1;
    }

    let malformed = report.malformed().count();
    println!(
        "Ingested {} batches: {} nodes, {} edges in graph",
        report.batches.len(),
        graph.node_count(),
        graph.edge_count()
    );
    for error in report.malformed() {
        println!("  malformed {}", error);
    }
    for dangling in &report.dangling {
        println!("  dropped batch {} row {}: {}", dangling.batch, dangling.row, dangling.error);
    }
    for violation in &report.validation.violations {
        println!("  {:?}: {}", violation.severity(), violation);
    }
    if malformed > 0 || !report.dangling.is_empty() || !report.validation.is_clean() {
        2
    } else {
        0
    }
}

fn cmd_validate(graph: &FosGraph, store: &JsonStore, all: bool) -> i32 {
    let report = if all { validate_all(graph) } else { validate(graph) };
    if graph.clear_pending(report.clean_marks()) > 0 {
        if let Err(e) = store.save(graph) {
            eprintln!("Error: failed to save snapshot: {}", e);
            return 1;
        }
    }

    if report.violations.is_empty() {
        println!("Checked {} nodes: no violations.", report.checked.len());
        return 0;
    }
    println!(
        "Checked {} nodes: {} errors, {} warnings",
        report.checked.len(),
        report.errors().count(),
        report.warnings().count()
    );
    for violation in &report.violations {
        println!("  {:?}: {}", violation.severity(), violation);
    }
    if report.is_clean() {
        0
    } else {
        2
    }
}

fn cmd_infer(graph: &FosGraph, store: &JsonStore, config: &EngineConfig, level: Option<Level>, apply: bool) -> i32 {
    let mut params = config.classify.clone();
    if let Some(level) = level {
        params.level = level;
    }
    let records = match infer_assignments(graph, &params) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if !apply {
        return print_json(&records);
    }

    let count = records.len();
    let mut session = IngestSession::with_format(graph, config.ingest.row_format());
    session.ingest_edges(records);
    let report = session.finalize();
    if let Err(e) = store.save(graph) {
        eprintln!("Error: failed to save snapshot: {}", e);
        return 1;
    }
    println!(
        "Applied {} inferred edges ({} violations)",
        count,
        report.validation.violations.len()
    );
    0
}

fn cmd_export(graph: &FosGraph, config: &EngineConfig, jsonl: bool, output: Option<PathBuf>) -> i32 {
    let export = TaxonomyExporter::new(graph)
        .keyword_delimiter(config.export.keyword_delimiter.clone())
        .export();
    if !export.skipped.is_empty() {
        eprintln!("Skipped {} topics without a complete chain", export.skipped.len());
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => match File::create(&path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error: cannot create '{}': {}", path.display(), e);
                return 1;
            }
        },
        None => Box::new(io::stdout().lock()),
    };
    let result = if jsonl {
        write_jsonl(&export.records, writer)
    } else {
        write_json(&export.records, writer)
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match EngineConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let (store, graph) = match open_store(cli.snapshot).and_then(|store| {
        let graph = load_graph(&store)?;
        Ok((store, graph))
    }) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Ingest {
            nodes,
            full_names,
            edges,
        } => cmd_ingest(&graph, &store, &config, &nodes, &full_names, &edges),
        Commands::Validate { all } => cmd_validate(&graph, &store, all),
        Commands::Path { id } => match resolve_path(&graph, &NodeId::from(id)) {
            Ok(path) => print_json(&path),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Classify {
            venue,
            level,
            hops,
            top,
            overwrite,
            roll_up,
        } => {
            let mut params = config.classify.clone().overwrite(overwrite || config.classify.overwrite);
            params.roll_up |= roll_up;
            if let Some(level) = level {
                params.level = level;
            }
            if let Some(hops) = hops {
                params.hops = hops;
            }
            if top.is_some() {
                params.top_n = top;
            }
            match classify_by_citation(&graph, &NodeId::from(venue), &params) {
                Ok(classification) => print_json(&classification),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Commands::Infer { level, apply } => cmd_infer(&graph, &store, &config, level, apply),
        Commands::Neighbors { id, top } => match keyword_neighborhood(&graph, &NodeId::from(id), top) {
            Ok(neighbors) => print_json(&neighbors),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Venues { id } => match venues_in_fos(&graph, &NodeId::from(id)) {
            Ok(venues) => print_json(&venues),
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Commands::Export { jsonl, output } => cmd_export(&graph, &config, jsonl, output),
        Commands::Coverage { role, edge_type } => print_json(&annotation_coverage(&graph, role, edge_type)),
    };
    std::process::exit(code);
}
