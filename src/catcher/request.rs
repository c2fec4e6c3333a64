//! Captured request snapshot.
//!
//! # Responsibilities
//! - Snapshot method, path+query, headers, body, peer address and time
//! - Preserve header multiplicity and arrival order
//! - Bound the body read; truncate instead of failing the request
//!
//! # Design Decisions
//! - Header names are matched case-insensitively and rendered canonically
//!   (`x-test` → `X-Test`)
//! - Remote address comes from the socket, never from forwarded-for headers
//! - Body is kept as raw bytes and rendered UTF-8 lossy on the wire

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Ordered, case-insensitive header multimap.
///
/// Names keep the order in which they first appeared; values keep arrival
/// order within a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, creating the name if it is new.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, values)) => values.push(value),
            None => self.entries.push((canonical_name(name), vec![value])),
        }
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values for `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in map.iter() {
            headers.append(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// `content-type` → `Content-Type`.
fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Immutable snapshot of one caught request, as streamed to viewers.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedRequest {
    pub time: DateTime<Utc>,
    pub host: String,
    pub method: String,
    /// Path including the query string.
    pub path: String,
    pub headers: Headers,
    #[serde(serialize_with = "serialize_lossy")]
    pub body: Bytes,
    pub body_truncated: bool,
    pub remote_addr: String,
    /// HTTP/1.1 style text rendering for display.
    pub raw_request: String,
}

impl CapturedRequest {
    /// Snapshot `request`, reading at most `max_body_bytes` of its body.
    ///
    /// Body read errors and oversized bodies both yield a truncated body.
    pub async fn capture(
        request: Request<Body>,
        host: String,
        remote_addr: Option<SocketAddr>,
        max_body_bytes: usize,
    ) -> Self {
        let time = Utc::now();
        let (parts, body) = request.into_parts();

        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let headers = Headers::from(&parts.headers);
        let (body, body_truncated) = read_bounded(body, max_body_bytes).await;
        let method = parts.method.to_string();
        let raw_request = render_raw(
            &method,
            &path,
            &format!("{:?}", parts.version),
            &host,
            &headers,
            &body,
        );

        Self {
            time,
            host,
            method,
            path,
            headers,
            body,
            body_truncated,
            remote_addr: remote_addr
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            raw_request,
        }
    }

    /// Body as display text.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn serialize_lossy<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(body))
}

/// Read up to `limit` bytes. Returns the bytes read and whether anything was cut off.
async fn read_bounded(body: Body, limit: usize) -> (Bytes, bool) {
    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                let remaining = limit - buf.len();
                if chunk.len() > remaining {
                    buf.extend_from_slice(&chunk[..remaining]);
                    tracing::debug!(limit, "Captured body truncated at limit");
                    return (Bytes::from(buf), true);
                }
                buf.extend_from_slice(&chunk);
            }
            Err(e) => {
                tracing::debug!(error = %e, read = buf.len(), "Body read failed, keeping partial body");
                return (Bytes::from(buf), true);
            }
        }
    }

    (Bytes::from(buf), false)
}

fn render_raw(
    method: &str,
    path: &str,
    version: &str,
    host: &str,
    headers: &Headers,
    body: &[u8],
) -> String {
    let mut raw = String::new();
    let _ = write!(raw, "{method} {path} {version}\r\n");
    let _ = write!(raw, "Host: {host}\r\n");
    for (name, values) in headers.iter() {
        if name.eq_ignore_ascii_case(header::HOST.as_str()) {
            continue;
        }
        for value in values {
            let _ = write!(raw, "{name}: {value}\r\n");
        }
    }
    raw.push_str("\r\n");
    raw.push_str(&String::from_utf8_lossy(body));
    raw
}
