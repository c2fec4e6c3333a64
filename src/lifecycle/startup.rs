//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics before any traffic
//! - Bind the plain listener and, when configured, the TLS listener
//! - Install signal handling and run until shutdown
//!
//! # Design Decisions
//! - Fail fast: any bind or certificate error is fatal
//! - Listeners start last (traffic only when ready)

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{CatcherConfig, TlsConfig};
use crate::http::HttpServer;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS file not found: {}", .0.display())]
    MissingTlsFile(PathBuf),

    #[error("failed to load TLS certificate: {0}")]
    Tls(#[source] io::Error),

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Run the catcher until a termination signal arrives.
pub async fn run(config: CatcherConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let tls = match &config.listener.tls {
        Some(tls) => Some(load_tls(tls).await?),
        None => None,
    };

    let listener = bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config);
    let shutdown = server.shutdown_handle();
    spawn_signal_handler(shutdown.clone());

    let tls_task = tls.map(|(addr, rustls)| tokio::spawn(server.clone().run_tls(addr, rustls)));

    let result = server.run(listener).await;

    // The plain listener can stop on its own; make sure TLS follows.
    shutdown.trigger();
    if let Some(task) = tls_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "HTTPS server failed"),
            Err(e) => tracing::error!(error = %e, "HTTPS server task panicked"),
            Ok(Ok(())) => {}
        }
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

async fn load_tls(tls: &TlsConfig) -> Result<(SocketAddr, RustlsConfig), StartupError> {
    let addr = tls
        .bind_address
        .parse::<SocketAddr>()
        .map_err(|e| StartupError::Bind {
            address: tls.bind_address.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e),
        })?;

    for path in [&tls.cert_path, &tls.key_path] {
        if !path.exists() {
            return Err(StartupError::MissingTlsFile(path.clone()));
        }
    }

    let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(StartupError::Tls)?;
    Ok((addr, rustls))
}
