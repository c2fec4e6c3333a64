//! Subscribe endpoint: admission and WebSocket upgrade.
//!
//! # Responsibilities
//! - Reject non-GET with 405 before touching any tenant
//! - Abandon non-WebSocket requests without tenant mutation
//! - Admit the viewer (405 if an exclusive tenant is occupied)
//! - Hand the upgraded socket to the viewer's delivery loop
//!
//! # Data Flow
//! ```text
//! Viewer ←──── one JSON text frame per caught request ──── Catcher
//! ```

use std::time::Duration;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::catcher::{AdmissionError, Subscription};
use crate::http::request::request_host;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const SUBSCRIBE_PATH: &str = "/init-client";

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        tracing::info!(error = %self, "Subscribe rejected");
        metrics::record_subscribe_rejected(self.reason());
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n").into_response()
    }
}

pub async fn init_client(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if method != Method::GET {
        return AdmissionError::MethodNotAllowed(method.to_string()).into_response();
    }

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Subscribe request is not a WebSocket upgrade");
            metrics::record_subscribe_rejected("not_websocket");
            return rejection.into_response();
        }
    };

    let host = request_host(&headers, &uri).unwrap_or_default();
    let tenant = state.registry.get_or_create(&host);
    let subscription = match Subscription::admit(
        tenant,
        state.admission_policy(),
        state.config.viewer.send_buffer_size,
    ) {
        Ok(subscription) => subscription,
        Err(e) => return e.into_response(),
    };

    let viewer = subscription.id();
    let signal = state.shutdown.signal();
    let write_timeout = Duration::from_secs(state.config.viewer.write_timeout_secs);
    tracing::info!(host = %subscription.tenant().host(), viewer = %viewer, "Initializing a new viewer");

    // Dropping the unused closure on a failed upgrade releases the registration.
    upgrade
        .on_failed_upgrade(move |e: axum::Error| {
            tracing::warn!(viewer = %viewer, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| subscription.run(socket, signal, write_timeout))
}
