//! Pairup serve command
//!
//! Runs the matchmaking server in the foreground until Ctrl-C.

use anyhow::Result;
use clap::Args;
use pairup_server::PairupServer;
use tracing::{info, warn};

use crate::config::{ConfigLoader, PairupConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Seconds a dropped participant may take to reconnect
    #[arg(long)]
    pub grace_secs: Option<u64>,
}

impl ServeArgs {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, mut config: PairupConfig) -> PairupConfig {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(grace) = self.grace_secs {
            config.matchmaking.grace_period_secs = grace;
        }
        config
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?);
    let server_config = config.server_config();

    info!(
        addr = %server_config.addr(),
        grace_period_secs = server_config.coordinator.grace_period_secs,
        "Starting pairup server"
    );

    let server = PairupServer::new(server_config);
    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        shutdown.cancel();
    });

    server.run().await?;
    Ok(())
}
