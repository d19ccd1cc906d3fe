//! Cophylogeny Kernel Binary
//!
//! Runs the counting and dating kernels over JSON files and prints JSON
//! results on stdout. Logs go to stderr.
//!
//! ## Commands
//!
//! - `count <graph.json>`: build the reconciliation graph, sample a template
//!   and print a `CountReport`
//! - `date <host.json> <reconciliations.json>`: date each reconciliation
//!   against the host tree and print one `DatedReconciliation` per input
//!
//! ## Configuration
//!
//! Environment variables:
//! - `COPHYLO_TEMPLATE_SEED`: template sampling seed (default: 0)
//! - `COPHYLO_MAX_RESOLUTION_ATTEMPTS`: re-datings per reconciliation (default: 1)
//! - `COPHYLO_INCLUDE_SUPERCOUNTS`: include outside tables in reports (default: true)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin cophylo_kernel -- count graph.json
//! LOG_FORMAT=pretty cargo run --bin cophylo_kernel -- date host.json recons.json
//! ```

use std::error::Error;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cophylo_kernel::{Adjacency, CountReport, DatingPipeline, KernelConfig, ReconGraphInput};

const USAGE: &str = "usage: cophylo_kernel count <graph.json>\n       cophylo_kernel date <host.json> <reconciliations.json>";

/// Initialize the tracing subscriber with JSON or pretty format, on stderr
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cophylo_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

fn run_count(graph_path: &Path, config: &KernelConfig) -> Result<(), Box<dyn Error>> {
    let input: ReconGraphInput = read_json(graph_path)?;
    let report = CountReport::build(&input, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_date(
    host_path: &Path,
    reconciliations_path: &Path,
    config: KernelConfig,
) -> Result<(), Box<dyn Error>> {
    let host: Adjacency<String> = read_json(host_path)?;
    let reconciliations: Vec<Adjacency<String>> = read_json(reconciliations_path)?;

    let mut pipeline = DatingPipeline::without_resolver(config);
    let results = pipeline.run(&host, &reconciliations)?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = KernelConfig::from_env()?;
    info!(
        version = %config.version,
        params_hash = %config.params_hash(),
        seed = config.template_seed,
        "Starting cophylogeny kernel"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, graph] if cmd == "count" => run_count(Path::new(graph), &config),
        [cmd, host, recons] if cmd == "date" => run_date(Path::new(host), Path::new(recons), config),
        _ => Err(USAGE.into()),
    }
}
