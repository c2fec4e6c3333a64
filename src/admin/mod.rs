//! Admin endpoints on the root host.
//!
//! Served only when `admin.enabled`. The same paths on any other host, or
//! with a method the admin surface does not answer, are caught like every
//! other request.

pub mod auth;
pub mod handlers;

use axum::routing::get;
use axum::{middleware, Router};

use self::auth::admin_gate;
use self::handlers::{get_status, get_tenants};
use crate::http::capture::catch_request;
use crate::http::server::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status).fallback(catch_request))
        .route("/admin/tenants", get(get_tenants).fallback(catch_request))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_gate))
}
