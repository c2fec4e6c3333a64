//! Request catcher server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               REQUEST CATCHER                │
//!   Any request          │  ┌──────────┐    ┌─────────┐   ┌───────────┐ │
//!   ─────────────────────┼─▶│ redirect │───▶│ router  │──▶│  capture  │ │
//!   (tenant.host/...)    │  │  www.    │    │         │   └─────┬─────┘ │
//!                        │  └──────────┘    └────┬────┘         │       │
//!                        │                       │              ▼       │
//!   GET /init-client     │                       ▼        ┌──────────┐  │
//!   ─────────────────────┼──────────────▶ ┌───────────┐   │ registry │  │
//!                        │                │ websocket │──▶│ + tenant │  │
//!   JSON frames          │  ┌────────┐    │ admission │   └────┬─────┘  │
//!   ◀────────────────────┼──│ viewer │◀───┴───────────┘        │        │
//!                        │  │  task  │◀────── queue ───────────┘        │
//!                        │  └────────┘                                  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use request_catcher::config::{load_config, CatcherConfig};
use request_catcher::lifecycle::startup;
use request_catcher::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "request-catcher")]
#[command(about = "Catch HTTP requests per subdomain and stream them to the browser", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => CatcherConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("request-catcher v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        root_host = %config.root_host,
        allow_multiple = config.allow_multiple,
        admin = config.admin.enabled,
        "Configuration loaded"
    );

    startup::run(config).await?;
    Ok(())
}
