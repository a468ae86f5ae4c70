use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use iotmap_config::IotmapConfig;
use iotmap_core::{Layer, NodeId, NodeRecord};
use iotmap_modelling::{Modeller, ModellingParams};
use iotmap_store::{GraphState, GraphStore, MemoryStore, ResultRow};
use iotmap_telemetry::metrics::MetricsRecorder;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file overriding config/iotmap.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build graph layers from a unified-format capture
    Model(ModelArgs),
    /// Inspect and edit the node population of a graph snapshot
    Nodes(NodesArgs),
    /// Sweep correlation windows and diff against expected results
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Capture converted to the unified CSV format
    #[arg(short = 'f', long)]
    pub csv: Option<PathBuf>,

    /// Node-list file; when absent, nodes are extracted from the feed
    #[arg(short, long)]
    pub nodes: Option<PathBuf>,

    /// Graph snapshot to load before building
    #[arg(long)]
    pub graph: Option<PathBuf>,

    /// Write the resulting graph snapshot here
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Layer to build (2 = datalink .. 5 = application)
    #[arg(short, long)]
    pub level: Option<u8>,

    /// Delay for an object to respond to a request
    #[arg(long)]
    pub tdelta1: Option<f64>,

    /// Delay for an object to forward a packet; negative disables
    /// controller detection
    #[arg(long)]
    pub tdelta2: Option<f64>,

    /// Delay for a controller to forward a packet
    #[arg(long)]
    pub adelta: Option<f64>,

    /// Pattern name overriding the configured one for the target layer
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Write the results view to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct NodesArgs {
    /// Graph snapshot to operate on
    #[arg(long)]
    pub graph: PathBuf,

    #[command(subcommand)]
    pub action: NodesAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum NodesAction {
    /// List the stored node population
    List,
    /// Add nodes from a node-list file or one inline definition
    Add {
        /// Node-list file (`id,dl1;dl2,nwk1;nwk2` per row)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Datalink addresses, ';'-separated
        #[arg(short, long)]
        dl: Option<String>,
        /// Network addresses, ';'-separated
        #[arg(short, long)]
        nwk: Option<String>,
        /// Identifier for the node
        #[arg(short, long)]
        id: Option<u32>,
    },
    /// Merge the addresses of two nodes into a fresh node
    Merge {
        #[arg(long)]
        node1: u32,
        #[arg(long)]
        node2: u32,
    },
    /// Remove a node and its edges from every layer
    Remove {
        #[arg(short, long)]
        id: u32,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Capture converted to the unified CSV format
    #[arg(short = 'f', long)]
    pub csv: PathBuf,

    /// Expected results CSV to diff against
    #[arg(short, long)]
    pub expected: PathBuf,

    /// Node-list file; when absent, nodes are extracted from the feed
    #[arg(short, long)]
    pub nodes: Option<PathBuf>,

    /// Report file
    #[arg(short, long, default_value = "results.txt")]
    pub output: PathBuf,

    /// tdelta1 half-open range: start end step
    #[arg(long, num_args = 3, value_names = ["START", "END", "STEP"])]
    pub tdelta1: Vec<f64>,

    /// tdelta2 half-open range: start end step
    #[arg(long, num_args = 3, value_names = ["START", "END", "STEP"])]
    pub tdelta2: Vec<f64>,

    /// adelta half-open range: start end step
    #[arg(long, num_args = 3, value_names = ["START", "END", "STEP"])]
    pub adelta: Vec<f64>,
}

pub fn run_model(
    args: ModelArgs,
    config_path: Option<PathBuf>,
    metrics: MetricsRecorder,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let level = args.level.unwrap_or(config.modelling.level);
    let layer = Layer::from_label(level).context("level must be between 2 and 5")?;
    let params = ModellingParams {
        tdelta1: args.tdelta1.unwrap_or(config.modelling.tdelta1),
        tdelta2: args.tdelta2.unwrap_or(config.modelling.tdelta2),
        adelta: args.adelta.unwrap_or(config.modelling.adelta),
    };
    let pattern = match args.pattern {
        Some(pattern) => pattern,
        None => config
            .patterns
            .for_level(level)
            .context("no configured pattern for this level")?
            .to_string(),
    };

    let store = match &args.graph {
        Some(path) => MemoryStore::from_state(load_snapshot(path)?),
        None => MemoryStore::new(),
    };
    let modeller = Modeller::new(store);

    let batch = match &args.csv {
        Some(path) => {
            let batch = iotmap_feed::load_csv(path)
                .with_context(|| format!("loading feed {}", path.display()))?;
            metrics.record_ingest(batch.transmissions.len(), batch.dropped);
            let nodes = match &args.nodes {
                Some(nodes_file) => iotmap_feed::load_nodes(nodes_file)
                    .with_context(|| format!("loading nodes {}", nodes_file.display()))?,
                None => iotmap_feed::extract_nodes(&batch.transmissions),
            };
            info!(
                nodes = nodes.len(),
                transmissions = batch.transmissions.len(),
                dropped = batch.dropped,
                "feed ingested"
            );
            modeller.seed_nodes(&nodes)?;
            Some(batch)
        }
        None => None,
    };

    let started = Instant::now();
    let report = modeller.rebuild(
        layer,
        &pattern,
        &params,
        batch.as_ref().map(|b| b.transmissions.as_slice()),
    )?;
    metrics.record_rebuild(
        report.output.edges_created,
        report.output.dropped,
        started.elapsed().as_secs_f64(),
    );

    let snapshot = modeller.store().snapshot();
    let rows = snapshot.results();
    for row in &rows {
        println!("{}", format_row(row).join(", "));
    }
    if let Some(path) = &args.output {
        write_results(path, &rows)?;
        info!(rows = rows.len(), output = %path.display(), "results exported");
    }
    if let Some(path) = &args.save {
        save_snapshot(path, &snapshot)?;
        info!(snapshot = %path.display(), "graph snapshot saved");
    }
    debug!(metrics = %metrics.gather_metrics().unwrap_or_default(), "run metrics");
    Ok(())
}

pub fn run_nodes(args: NodesArgs) -> anyhow::Result<()> {
    let store = MemoryStore::from_state(load_snapshot(&args.graph)?);

    match args.action {
        NodesAction::List => {
            println!("id\tdl addresses\tnwk addresses");
            for node in store.snapshot().nodes_at(Layer::Datalink) {
                println!(
                    "{}\t{}\t{}",
                    node.id,
                    join_set(node.dl_addrs.iter()),
                    join_set(node.nwk_addrs.iter())
                );
            }
            return Ok(());
        }
        NodesAction::Add { file, dl, nwk, id } => {
            let nodes = match file {
                Some(file) => iotmap_feed::load_nodes(&file)?,
                None => {
                    let (Some(dl), Some(nwk), Some(id)) = (dl, nwk, id) else {
                        bail!("either --file or --dl/--nwk/--id is required");
                    };
                    vec![NodeRecord::new(
                        NodeId(id),
                        Layer::Datalink,
                        split_addresses(&dl),
                        split_addresses(&nwk),
                    )]
                }
            };
            store.run_in_transaction(|g| -> anyhow::Result<()> {
                for node in &nodes {
                    g.create_node(node.clone());
                }
                Ok(())
            })?;
            info!(nodes = nodes.len(), "nodes added");
        }
        NodesAction::Merge { node1, node2 } => {
            let merged = store.run_in_transaction(|g| {
                g.merge_nodes(NodeId(node1), NodeId(node2))
                    .map_err(anyhow::Error::from)
            })?;
            println!("merged {node1} and {node2} into {merged}");
        }
        NodesAction::Remove { id } => {
            store.run_in_transaction(|g| -> anyhow::Result<()> {
                if !g.remove_node(NodeId(id)) {
                    bail!("node {id} does not exist");
                }
                Ok(())
            })?;
            info!(id, "node removed");
        }
    }

    save_snapshot(&args.graph, &store.snapshot())
}

pub fn run_sweep(args: SweepArgs, metrics: MetricsRecorder) -> anyhow::Result<()> {
    let batch = iotmap_feed::load_csv(&args.csv)
        .with_context(|| format!("loading feed {}", args.csv.display()))?;
    metrics.record_ingest(batch.transmissions.len(), batch.dropped);

    let expected = read_expected(&args.expected)?;

    let modeller = Modeller::new(MemoryStore::new());
    let nodes = match &args.nodes {
        Some(nodes_file) => iotmap_feed::load_nodes(nodes_file)?,
        None => iotmap_feed::extract_nodes(&batch.transmissions),
    };
    modeller.seed_nodes(&nodes)?;

    // The lower layers do not depend on the swept windows; build them once.
    modeller.rebuild(
        Layer::Network,
        "nwk_transmission",
        &ModellingParams::default(),
        Some(&batch.transmissions),
    )?;

    let mut report = format!(
        "# iotmap sweep {}\n# feed: {}\n# expected rows: {}\n",
        Utc::now().to_rfc3339(),
        args.csv.display(),
        expected.len()
    );

    for t1 in range_values(&args.tdelta1)? {
        for t2 in range_values(&args.tdelta2)? {
            for a in range_values(&args.adelta)? {
                let params = ModellingParams {
                    tdelta1: t1,
                    tdelta2: t2,
                    adelta: a,
                };
                modeller.rebuild(Layer::Transport, "transport_transmission", &params, None)?;
                modeller.rebuild(Layer::Application, "interact", &params, None)?;

                let rows: Vec<Vec<String>> = modeller
                    .store()
                    .snapshot()
                    .results()
                    .iter()
                    .map(|r| format_row(r).to_vec())
                    .collect();
                let missing: Vec<&Vec<String>> =
                    expected.iter().filter(|r| !rows.contains(*r)).collect();
                let extra: Vec<&Vec<String>> =
                    rows.iter().filter(|r| !expected.contains(*r)).collect();

                report.push_str(&format!(
                    "\ntdelta1: {t1:.3}\ttdelta2: {t2:.3}\tadelta: {a:.3}\n\
                     current: {}\tmissing: {}\textra: {}\n",
                    rows.len(),
                    missing.len(),
                    extra.len()
                ));
                for row in missing {
                    report.push_str(&format!("  - {}\n", row.join(", ")));
                }
                for row in extra {
                    report.push_str(&format!("  + {}\n", row.join(", ")));
                }
            }
        }
    }

    fs::write(&args.output, report)
        .with_context(|| format!("writing report {}", args.output.display()))?;
    println!("sweep report written to {}", args.output.display());
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<IotmapConfig> {
    let config = match path {
        Some(path) => IotmapConfig::load_from_path(path)?,
        None => IotmapConfig::load()?,
    };
    Ok(config)
}

fn load_snapshot(path: &Path) -> anyhow::Result<GraphState> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading graph snapshot {}", path.display()))?;
    Ok(serde_yaml::from_str(&text)?)
}

fn save_snapshot(path: &Path, state: &GraphState) -> anyhow::Result<()> {
    fs::write(path, serde_yaml::to_string(state)?)
        .with_context(|| format!("writing graph snapshot {}", path.display()))
}

fn split_addresses(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_set<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values.cloned().collect::<Vec<_>>().join(";")
}

fn format_row(row: &ResultRow) -> [String; 5] {
    [
        join_set(row.src_nwk.iter()),
        row.src_role
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(";"),
        join_set(row.dst_nwk.iter()),
        row.dst_role
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(";"),
        row.kind.as_str().to_string(),
    ]
}

fn write_results(path: &Path, rows: &[ResultRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("writing results {}", path.display()))?;
    for row in rows {
        writer.write_record(format_row(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_expected(path: &Path) -> anyhow::Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("reading expected results {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn range_values(spec: &[f64]) -> anyhow::Result<Vec<f64>> {
    let [start, end, step] = spec else {
        bail!("a sweep range takes exactly three values: start end step");
    };
    if *step <= 0.0 || !step.is_finite() {
        bail!("sweep step must be positive");
    }
    let mut values = Vec::new();
    let mut current = *start;
    while current < *end {
        values.push(current);
        current += step;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn range_is_half_open() {
        let values = range_values(&[0.5, 0.8, 0.1]).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 0.5);
        assert!(values.last().unwrap() < &0.8);
        assert!(range_values(&[0.0, 1.0, 0.0]).is_err());
        assert!(range_values(&[0.0, 1.0]).is_err());
    }

    #[test]
    fn result_rows_format_with_semicolons() {
        use iotmap_core::{Role, RoleSet};
        use iotmap_store::ResultKind;
        use std::collections::BTreeSet;

        let row = ResultRow {
            src_nwk: BTreeSet::from(["fe80::1".to_string(), "0x1".to_string()]),
            src_role: RoleSet::of([Role::Source]),
            dst_nwk: BTreeSet::from(["0x2".to_string()]),
            dst_role: RoleSet::of([Role::Sink]),
            kind: ResultKind::Trans,
        };
        assert_eq!(
            format_row(&row),
            [
                "0x1;fe80::1".to_string(),
                "source".to_string(),
                "0x2".to_string(),
                "sink".to_string(),
                "TRANSEdge".to_string(),
            ]
        );
    }
}
