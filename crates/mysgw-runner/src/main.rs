//! `mysgw`: bridge a sensor-network gateway to host items.
//!
//! Reads a YAML configuration, opens the gateway link, keeps it healthy and
//! accepts item commands on stdin until Ctrl-C.

use std::error::Error;
use std::io::{self, BufRead};
#[cfg(feature = "prometheus")]
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use mysgw_bridge::{Dispatcher, HealthMonitor, MemoryStateStore};
use mysgw_link::StreamConnector;
use mysgw_runner::{CommandBus, RunnerConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mysgw", version, about = "Bridge a sensor-network gateway to host items")]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, default_value = "mysgw.yaml")]
    config: PathBuf,

    /// Log filter, e.g. `debug` or `mysgw_link=trace`. `RUST_LOG` wins if set
    #[arg(long)]
    log_level: Option<String>,

    /// Health check period in milliseconds, overriding the configuration
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[cfg(feature = "prometheus")]
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match RunnerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: cannot load {}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    let level = args.log_level.as_deref().or(config.log_level.as_deref()).unwrap_or("info");
    init_logging(level);

    if let Some(refresh_ms) = args.refresh_ms {
        config.gateway.refresh_interval_ms = refresh_ms;
    }

    match run(config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mysgw stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_thread_names(true).init();
}

fn run(config: RunnerConfig, args: &Args) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "prometheus")]
    {
        if let Some(addr) = args.metrics_addr {
            mysgw_metrics::install_prometheus(addr)?;
            info!(%addr, "serving metrics");
        }
    }
    #[cfg(not(feature = "prometheus"))]
    let _ = args;
    mysgw_metrics::describe_metrics();

    let items = Arc::new(config.binding_table()?);
    let state = Arc::new(MemoryStateStore::new());
    info!(items = items.len(), transport = %config.gateway.transport, "starting gateway bridge");

    let dispatcher = Arc::new(Dispatcher::new(
        config.gateway.clone(),
        items.clone(),
        state.clone(),
        Arc::new(StreamConnector),
    ));
    if let Err(e) = dispatcher.start() {
        warn!(error = %e, "gateway unavailable at startup, will retry");
    }
    let mut monitor = HealthMonitor::spawn(dispatcher.clone(), config.gateway.refresh_interval())?;

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })?;

    let bus = CommandBus::new(dispatcher.clone(), items, state);
    thread::Builder::new()
        .name("mysgw-stdin".to_string())
        .spawn(move || read_commands(&bus))?;

    let _ = shutdown_rx.recv();
    info!("shutting down");
    monitor.stop();
    dispatcher.stop();
    Ok(())
}

/// Execute stdin lines until EOF.
fn read_commands(bus: &CommandBus) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "stdin closed");
                return;
            }
        };
        match bus.execute_line(&line) {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }
}
