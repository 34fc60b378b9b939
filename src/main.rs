//! Security Gateway
//!
//! An HTTP front door that asks an external security service about every
//! request before letting it through.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               SECURITY GATEWAY               │
//!                         │                                              │
//!     Client Request      │  ┌──────────┐   ┌────────────┐   ┌─────────┐ │
//!     ────────────────────┼─▶│  tower   │──▶│  security  │──▶│ routes  │ │
//!                         │  │  layers  │   │ middleware │   │handlers │ │
//!                         │  └──────────┘   └─────┬──────┘   └────┬────┘ │
//!                         │                       │               │      │
//!                         │                       ▼               ▼      │
//!                         │                 ┌─────────────────────────┐  │
//!                         │                 │     SecurityClient      │──┼──▶ Security
//!                         │                 │ validate / scan / health│  │    Service
//!                         │                 └─────────────────────────┘  │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use security_gateway::config::load_config;
use security_gateway::observability::{logging, metrics};
use security_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "security-gateway")]
#[command(about = "HTTP gateway that validates every request with an external security service", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Base URL of the security service.
    #[arg(short, long)]
    security_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), |config| {
        if let Some(bind) = cli.bind {
            config.listener.bind_address = bind;
        }
        if let Some(url) = cli.security_url {
            config.security.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(level) = cli.log_level {
            config.observability.log_level = level;
        }
    })?;

    logging::init_logging(&config.observability);

    tracing::info!("security-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        security_service = %config.security.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
