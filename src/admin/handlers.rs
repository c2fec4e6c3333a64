use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::catcher::TenantSummary;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub root_host: String,
    pub allow_multiple: bool,
    pub tenants: usize,
    pub viewers: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        root_host: state.config.root_host.clone(),
        allow_multiple: state.config.allow_multiple,
        tenants: state.registry.len(),
        viewers: state.registry.total_subscribers(),
    })
}

pub async fn get_tenants(State(state): State<AppState>) -> Json<Vec<TenantSummary>> {
    Json(state.registry.snapshot())
}
