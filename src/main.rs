//! graph-analytics - knowledge graph analytics over JSON snapshots
//!
//! Reads snapshot files (`{"nodes": [...], "links": [...]}`) and prints the
//! analysis as JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notegraph_analytics::graph::paths::{all_paths, shortest_path};
use notegraph_analytics::graph::{
    AnalyticsEngine, GraphAnalyticsEngine, GraphSnapshot, InMemorySnapshotSource,
};
use notegraph_analytics::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Graph id under which CLI inputs are registered with the snapshot source.
const CLI_GRAPH: &str = "cli";

#[derive(Parser)]
#[command(name = "graph-analytics")]
#[command(about = "Structural analytics for note-taking knowledge graphs")]
struct Cli {
    /// Path to a YAML config file (defaults to ./config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Abort long computations after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report: centrality, communities, cut structure, rankings
    Report {
        /// Snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Shortest path (or every simple path) between two nodes
    Path {
        /// Snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Source node id
        #[arg(long)]
        from: String,

        /// Target node id
        #[arg(long)]
        to: String,

        /// Enumerate all simple paths instead of the shortest one
        #[arg(long)]
        all: bool,

        /// Hop bound for --all (overrides config)
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Partition the graph into communities
    Communities {
        /// Snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// louvain, modularity, components or connected_components
        #[arg(short, long)]
        algorithm: Option<String>,
    },

    /// Metric trends over snapshots, oldest first
    Trends {
        /// Snapshot JSON files in chronological order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;
    if cli.timeout_ms.is_some() {
        config.analytics.timeout_ms = cli.timeout_ms;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let source = Arc::new(InMemorySnapshotSource::new());
    let engine = GraphAnalyticsEngine::new(source.clone(), config.analytics.clone());

    match cli.command {
        Commands::Report { input } => {
            source.insert(CLI_GRAPH, load_snapshot(&input)?).await;
            print_json(&engine.analyze_graph(CLI_GRAPH).await?)
        }
        Commands::Path {
            input,
            from,
            to,
            all,
            max_length,
        } => {
            let snapshot = load_snapshot(&input)?;
            for id in [&from, &to] {
                if !snapshot.contains(id) {
                    bail!("node '{}' not found in {}", id, input.display());
                }
            }
            if all {
                let max_length = max_length.unwrap_or(engine.config().max_path_length);
                let paths = all_paths(&snapshot, &from, &to, max_length, &engine.interrupt())?;
                print_json(&paths)
            } else {
                print_json(&shortest_path(&snapshot, &from, &to)?)
            }
        }
        Commands::Communities { input, algorithm } => {
            let snapshot = load_snapshot(&input)?;
            let algorithm =
                algorithm.unwrap_or_else(|| engine.config().community_algorithm.to_string());
            print_json(&engine.communities(&snapshot, &algorithm)?)
        }
        Commands::Trends { inputs } => {
            for input in &inputs {
                source.insert(CLI_GRAPH, load_snapshot(input)?).await;
            }
            print_json(&engine.analyze_history(CLI_GRAPH).await?)
        }
    }
}

fn load_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = GraphSnapshot::from_json(&json)
        .with_context(|| format!("Invalid snapshot in {}", path.display()))?;
    tracing::debug!(
        nodes = snapshot.node_count(),
        links = snapshot.link_count(),
        "Loaded {}",
        path.display()
    );
    Ok(snapshot)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
