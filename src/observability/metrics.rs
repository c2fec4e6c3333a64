//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catcher_requests_total` (counter): caught requests by outcome
//! - `catcher_events_delivered_total` (counter): events enqueued to viewers
//! - `catcher_viewers_evicted_total` (counter): viewers dropped by reason
//! - `catcher_subscribe_rejected_total` (counter): refused admissions by reason
//! - `catcher_active_viewers` (gauge): currently attached viewers
//! - `catcher_tenants` (gauge): tenants in the registry

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// `outcome` is one of `broadcast`, `no_tenant`, `no_viewers`.
pub fn record_capture(outcome: &'static str) {
    counter!("catcher_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_events_delivered(count: usize) {
    if count > 0 {
        counter!("catcher_events_delivered_total").increment(count as u64);
    }
}

pub fn record_viewer_evicted(reason: &'static str) {
    counter!("catcher_viewers_evicted_total", "reason" => reason).increment(1);
}

pub fn record_subscribe_rejected(reason: &'static str) {
    counter!("catcher_subscribe_rejected_total", "reason" => reason).increment(1);
}

pub fn viewer_attached() {
    gauge!("catcher_active_viewers").increment(1.0);
}

pub fn viewer_detached() {
    gauge!("catcher_active_viewers").decrement(1.0);
}

pub fn record_tenant_count(count: usize) {
    gauge!("catcher_tenants").set(count as f64);
}
