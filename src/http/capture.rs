//! Catch-all capture handler.
//!
//! Anything the router does not claim lands here. The response is the same
//! fixed acknowledgment whether or not anyone is watching the host.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;

use crate::catcher::{normalize_host, CapturedRequest};
use crate::http::request::{remote_addr, request_host};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Body of every capture response.
pub const ACKNOWLEDGEMENT: &str = "ok";

pub async fn catch_request(
    State(state): State<AppState>,
    request: Request,
) -> (StatusCode, &'static str) {
    catch(&state, request).await;
    (StatusCode::OK, ACKNOWLEDGEMENT)
}

/// Snapshot `request` and broadcast it to its tenant, if anyone is listening.
///
/// Never creates a tenant and never fails.
pub async fn catch(state: &AppState, request: Request) {
    let host = request_host(request.headers(), request.uri())
        .map(|host| normalize_host(&host))
        .unwrap_or_default();

    let Some(tenant) = state.registry.lookup(&host) else {
        tracing::trace!(host = %host, "No tenant for host, dropping request");
        metrics::record_capture("no_tenant");
        return;
    };
    if tenant.subscriber_count() == 0 {
        tracing::trace!(host = %host, "No viewers for host, dropping request");
        metrics::record_capture("no_viewers");
        return;
    }

    let remote = remote_addr(request.extensions());
    let captured = CapturedRequest::capture(
        request,
        host,
        remote,
        state.config.capture.max_body_bytes,
    )
    .await;

    tracing::debug!(
        host = %captured.host,
        method = %captured.method,
        path = %captured.path,
        "Request caught"
    );
    let delivery = tenant.broadcast(Arc::new(captured));
    metrics::record_capture("broadcast");
    if delivery.evicted > 0 {
        tracing::debug!(
            host = %tenant.host(),
            delivered = delivery.delivered,
            evicted = delivery.evicted,
            "Broadcast dropped viewers"
        );
    }
}
