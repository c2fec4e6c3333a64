//! Static pages and assets.
//!
//! `GET /` serves the root page on the root host and the tenant index page
//! everywhere else; `/assets` and `/favicon.ico` come straight from disk.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::catcher::normalize_host;
use crate::config::FrontendConfig;
use crate::http::request::request_host;
use crate::http::server::AppState;

pub const ROOT_PAGE: &str = "root.html";
pub const INDEX_PAGE: &str = "index.html";

/// `GET /`.
pub async fn index(State(state): State<AppState>, request: Request) -> Response {
    let host = request_host(request.headers(), request.uri())
        .map(|host| normalize_host(&host))
        .unwrap_or_default();
    let page = if host == normalize_host(&state.config.root_host) {
        ROOT_PAGE
    } else {
        INDEX_PAGE
    };
    serve_file(state.config.frontend.dist_dir().join(page), request).await
}

async fn serve_file(path: PathBuf, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn one_year_from_now() -> Option<HeaderValue> {
    let expires = Utc::now() + Duration::days(365);
    HeaderValue::from_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()).ok()
}

/// `/assets/*` with long-lived cache headers, plus `/favicon.ico`.
pub fn asset_routes<S>(frontend: &FrontendConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .nest_service("/assets", ServeDir::new(frontend.dist_dir().join("assets")))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            |_: &Response<Body>| one_year_from_now(),
        ))
        .route_service("/favicon.ico", ServeFile::new(frontend.dir.join("favicon.ico")))
}
