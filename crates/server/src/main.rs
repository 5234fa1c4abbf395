//! vigil-server — data-quality monitor control plane.
//!
//! Discovers assertion monitors from the upstream catalog, schedules
//! their freshness assertions on cron triggers, evaluates them against
//! the datasets' warehouses, and emits run events back to the catalog.

mod http;
mod service;

use clap::Parser;
use tracing::{error, info};

use vigil_core::{config, Config};

use crate::service::Service;

/// Data-quality monitor service.
#[derive(Parser, Debug)]
#[command(name = "vigil-server", version, about)]
struct Cli {
    /// Port for the health endpoint (overrides MONITOR_SERVER_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    let mut config = Config::from_env();
    let cli = Cli::parse();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let default_filter = if config.server.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let service = Service::from_config(&config);
    info!("starting monitors");

    let manager = service.manager.clone();
    let manager_task = tokio::spawn(async move { manager.run().await });

    let health_task = tokio::spawn(http::serve(config.server.port));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        result = manager_task => {
            error!(?result, "monitor manager exited unexpectedly");
        }
        result = health_task => {
            error!(?result, "health endpoint exited unexpectedly");
        }
    }

    service.scheduler.shutdown().await;
    info!("scheduler stopped; exiting");
    Ok(())
}
