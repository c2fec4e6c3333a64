//! `www.` host canonicalization.
//!
//! Runs before routing: `www.example.com/foo?x=1` answers 301 to
//! `http://example.com/foo?x=1` and asks the client not to reuse the
//! connection.

use axum::extract::Request;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::request::request_host;

/// Host without its `www.` prefix, if it has one.
fn strip_www(host: &str) -> Option<&str> {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") && host.len() > 4 => Some(&host[4..]),
        _ => None,
    }
}

pub async fn redirect_www(request: Request, next: Next) -> Response {
    let Some(host) = request_host(request.headers(), request.uri()) else {
        return next.run(request).await;
    };
    let Some(bare) = strip_www(&host) else {
        return next.run(request).await;
    };

    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("http://{bare}{path}");
    let Ok(location) = HeaderValue::from_str(&target) else {
        return next.run(request).await;
    };

    tracing::debug!(from = %host, to = %target, "Redirecting www host");
    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
