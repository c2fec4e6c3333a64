//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, www redirect)
//! - Serve plain HTTP and, optionally, TLS
//! - Stop listeners and viewers on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{any, get};
use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::catcher::{AdmissionPolicy, TenantRegistry};
use crate::config::CatcherConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::{capture, pages, redirect, websocket};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CatcherConfig>,
    pub registry: Arc<TenantRegistry>,
    pub shutdown: Shutdown,
}

impl AppState {
    pub fn new(config: CatcherConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(TenantRegistry::new()),
            shutdown: Shutdown::new(),
        }
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::from_allow_multiple(self.config.allow_multiple)
    }
}

/// HTTP server for the request catcher.
#[derive(Clone)]
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: CatcherConfig) -> Self {
        let state = AppState::new(config);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = Arc::clone(&state.config);

        let mut router = Router::new()
            .route(
                "/",
                get(pages::index).fallback(capture::catch_request),
            )
            .route(websocket::SUBSCRIBE_PATH, any(websocket::init_client))
            .merge(pages::asset_routes(&config.frontend));

        if config.admin.enabled {
            router = router.merge(admin::routes(&state));
        }

        router
            .fallback(capture::catch_request)
            .with_state(state)
            .layer(middleware::from_fn(redirect::redirect_www))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, without connect info.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &CatcherConfig {
        &self.state.config
    }

    pub fn registry(&self) -> Arc<TenantRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Coordinator that stops this server and all of its viewers.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.state.shutdown.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut signal = self.state.shutdown.signal();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.wait().await })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Run a TLS listener on `addr` until shutdown.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let grace = Duration::from_secs(self.state.config.timeouts.shutdown_grace_secs);
        let mut signal = self.state.shutdown.signal();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            signal.wait().await;
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!(address = %addr, "HTTPS server stopped");
        Ok(())
    }
}
