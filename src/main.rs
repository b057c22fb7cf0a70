//! load-gate: admission control + circuit breaking for synthetic compute.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use load_gate::config::loader::load_config;
use load_gate::observability::{logging, metrics};
use load_gate::{GateConfig, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "load-gate")]
#[command(about = "Request-admission and upstream-resilience gate", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    logging::init(&config.observability.log_filter);

    tracing::info!("load-gate v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        queue_limit = config.admission.queue_limit,
        failure_threshold = config.breaker.failure_threshold,
        open_duration_ms = config.breaker.open_duration_ms,
        upstream_base_url = %config.upstream.base_url,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
