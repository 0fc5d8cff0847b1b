mod app;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use txgraph::config::{Config, load_config};
use txgraph::layout::CanvasSize;
use txgraph::session::GraphSession;
use txgraph::tx::{TxRecord, demo_transaction, load_transaction};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Transaction JSON file. A built-in demo transaction is shown when omitted.
    #[arg(long)]
    tx: Option<PathBuf>,
    /// JSON file with `grouping` and `layout` sections.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    group_threshold: Option<usize>,
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Step the layout without a window and print it as JSON.
    #[arg(long)]
    headless: bool,
    #[arg(long, default_value_t = 300)]
    steps: usize,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 800.0)]
    height: f32,
    #[arg(long, default_value_t = 1.0)]
    density: f32,
    /// Overrides RUST_LOG, e.g. `debug` or `txgraph=trace`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        if let Some(threshold) = self.group_threshold {
            config.grouping.group_threshold = threshold;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.grouping.chunk_size = chunk_size.max(1);
        }
        Ok(config)
    }

    fn transaction(&self) -> Result<TxRecord> {
        match &self.tx {
            Some(path) => load_transaction(path),
            None => Ok(demo_transaction()),
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Serialize)]
struct LayoutDump<'a> {
    txid: &'a str,
    width: f32,
    height: f32,
    density: f32,
    steps: u64,
    pixels_per_meter: f32,
    nodes: Vec<NodeDump<'a>>,
    edges: Vec<EdgeDump<'a>>,
}

#[derive(Serialize)]
struct NodeDump<'a> {
    id: &'a str,
    role: &'static str,
    children: usize,
    x: f32,
    y: f32,
    radius: f32,
}

#[derive(Serialize)]
struct EdgeDump<'a> {
    from: &'a str,
    to: &'a str,
}

fn run_headless(mut session: GraphSession, txid: &str, args: &Args) -> Result<()> {
    session.set_canvas(CanvasSize::new(args.width, args.height, args.density));
    let _lease = session.acquire_lease();
    for _ in 0..args.steps {
        session.step();
    }

    let graph = session.graph();
    let engine = session.engine();
    let nodes = session
        .snapshot()
        .iter()
        .filter_map(|layout| {
            let node = graph.node(&layout.id)?;
            Some(NodeDump {
                id: &layout.id,
                role: node.role.label(),
                children: node.children,
                x: layout.center.x,
                y: layout.center.y,
                radius: layout.radius,
            })
        })
        .collect();
    let edges = session
        .edges()
        .iter()
        .map(|edge| EdgeDump {
            from: &edge.from,
            to: &edge.to,
        })
        .collect();

    let dump = LayoutDump {
        txid,
        width: args.width,
        height: args.height,
        density: args.density,
        steps: engine.step_count(),
        pixels_per_meter: engine.pixels_per_meter(),
        nodes,
        edges,
    };
    let json = serde_json::to_string_pretty(&dump).context("failed to serialize layout")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = args.config()?;
    let tx = args.transaction()?;
    info!(
        txid = %tx.txid,
        inputs = tx.inputs.len(),
        outputs = tx.outputs.len(),
        "transaction loaded"
    );
    let session = GraphSession::from_transaction(&tx, &config);

    if args.headless {
        return run_headless(session, &tx.txid, &args);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 820.0]),
        ..Default::default()
    };
    let txid = tx.txid.clone();
    eframe::run_native(
        "txgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::TxGraphApp::new(cc, session, txid)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
