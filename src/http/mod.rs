//! HTTP protocol handling subsystem (the dispatcher).
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → redirect.rs (www. → bare host, before any routing)
//!     → router:
//!         GET /          → pages.rs (root page on root host, index elsewhere)
//!         /init-client   → websocket.rs (admission + upgrade)
//!         /assets, /favicon.ico → pages.rs (static files)
//!         /admin/*       → admin (root host only)
//!         anything else  → capture.rs (snapshot + broadcast, always "ok")
//! ```

pub mod capture;
pub mod pages;
pub mod redirect;
pub mod request;
pub mod server;
pub mod websocket;

pub use capture::ACKNOWLEDGEMENT;
pub use request::{remote_addr, request_host, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use websocket::SUBSCRIBE_PATH;
