//! stack-probe - Main Entry Point
//!
//! Builds a node with the built-in components, runs the probe commands given
//! on the command line through the handler thread, and prints the results.

use anyhow::{Context, Result};
use clap::Parser;
use stack_probe::{
    backend::{ProbeBackend, ProcfsThreadMetrics, ThreadMetrics},
    config::{default_config_path, MonitoringFlags, ProbeConfig},
    logging::init_logging,
    probe::{shared_stats, ProbeDispatcher, SUPPORTED_KEYS},
    protocols::{Counter, Diagnostics},
    stack::{Protocol, ProtocolStack},
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(
    name = "stack-probe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Run diagnostic probe commands against a component stack"
)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Print the result map as JSON.
    #[clap(long)]
    json: bool,
    /// Probe commands, e.g. `jmx`, `ops`, `threads=cpu=10`, `op=Counter.add[5]`
    commands: Vec<String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<ProbeConfig> {
    match path {
        Some(path) => {
            ProbeConfig::load(path).with_context(|| format!("loading config {:?}", path))
        }
        None => Ok(default_config_path()
            .map(|path| ProbeConfig::load_or_default(&path))
            .unwrap_or_default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(&config.logging)?;
    let span = tracing::info_span!("node", name = %config.node_name);
    let _entered = span.enter();

    if cli.commands.is_empty() {
        println!("Supported commands:");
        for key in SUPPORTED_KEYS {
            println!("  {}", key);
        }
        return Ok(());
    }

    let stats = shared_stats();
    let components: Vec<Arc<dyn Protocol>> = vec![
        Arc::new(Diagnostics::new(stats.clone())),
        Arc::new(Counter::new()),
    ];
    let stack = ProtocolStack::new(components)?;
    tracing::info!("Node stack: {:?}", stack);

    let metrics: Arc<dyn ThreadMetrics> =
        Arc::new(ProcfsThreadMetrics::new(&config.monitoring.task_root));
    let dispatcher = ProbeDispatcher::new(Arc::new(stack), metrics)
        .with_flags(Arc::new(MonitoringFlags::from_config(&config.monitoring)))
        .with_report_config(config.threads.clone())
        .with_stats(stats);

    let (backend, client) = ProbeBackend::new(Arc::new(dispatcher));
    let handle = backend.spawn()?;

    let result = client.request(cli.commands.as_slice());
    client.shutdown();
    if handle.join().is_err() {
        tracing::warn!("Probe handler thread panicked");
    }
    let result = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (key, value) in &result {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}
