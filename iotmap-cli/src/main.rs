//! ## iotmap-cli
//! **One-shot modelling interface**
//!
//! Builds the layered topology graph from a unified-format capture,
//! administers the node population of a saved graph snapshot, and sweeps
//! correlation windows against expected results.

use clap::Parser;
use iotmap_telemetry::logging::EventLogger;
use iotmap_telemetry::metrics::MetricsRecorder;

mod commands;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    EventLogger::init();
    let metrics = MetricsRecorder::new();
    let cli = Cli::parse();

    match cli.command {
        Commands::Model(args) => commands::run_model(args, cli.config, metrics),
        Commands::Nodes(args) => commands::run_nodes(args),
        Commands::Sweep(args) => commands::run_sweep(args, metrics),
    }
}
