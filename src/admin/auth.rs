//! Host gate and basic auth for the admin endpoints.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use crate::catcher::normalize_host;
use crate::config::AdminConfig;
use crate::http::capture::catch_request;
use crate::http::request::request_host;
use crate::http::server::AppState;

pub const REALM: &str = "admin";

pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let host = request_host(request.headers(), request.uri())
        .map(|host| normalize_host(&host))
        .unwrap_or_default();
    if host != normalize_host(&state.config.root_host) || request.method() != Method::GET {
        return catch_request(State(state), request).await.into_response();
    }

    if !authorized(request.headers(), &state.config.admin) {
        tracing::warn!(path = %request.uri().path(), "Admin authentication failed");
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
            "Unauthorized\n",
        )
            .into_response();
    }

    next.run(request).await
}

/// Checks `Authorization: Basic` against the configured credentials.
pub fn authorized(headers: &HeaderMap, admin: &AdminConfig) -> bool {
    if admin.password.is_empty() {
        return false;
    }
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, password)) = decoded.split_once(':') else {
        return false;
    };

    let user_ok = user.as_bytes().ct_eq(admin.user.as_bytes());
    let password_ok = password.as_bytes().ct_eq(admin.password.as_bytes());
    bool::from(user_ok & password_ok)
}
