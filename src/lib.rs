//! Multi-tenant HTTP request catcher.
//!
//! Every subdomain is a tenant. Requests sent to a tenant's host are
//! snapshotted and pushed, as JSON, to the browsers watching that host over
//! a WebSocket.

pub mod admin;
pub mod catcher;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use catcher::{CapturedRequest, TenantRegistry};
pub use config::schema::CatcherConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
