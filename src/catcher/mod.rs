//! Tenant registry and broadcast fan-out engine.
//!
//! # Data Flow
//! ```text
//! Captured HTTP request
//!     → request.rs (CapturedRequest snapshot, bounded body)
//!     → registry.rs (normalized host → Tenant, lookup only)
//!     → tenant.rs (fan-out: try_send into each viewer queue)
//!     → viewer.rs (per-viewer task drains queue → WebSocket frame)
//!
//! Subscribe:
//!     registry.rs get_or_create → viewer.rs admission → tenant.rs add
//! ```
//!
//! # Design Decisions
//! - Tenants are created lazily and never evicted
//! - Fan-out enqueues, it never flushes; the broadcaster never awaits a viewer
//! - A viewer whose queue is full is disconnected, not stalled
//! - No history: a viewer only sees requests captured after it attached

pub mod registry;
pub mod request;
pub mod tenant;
pub mod viewer;

pub use registry::{normalize_host, TenantRegistry, TenantSummary};
pub use request::{CapturedRequest, Headers};
pub use tenant::{Delivery, Event, Tenant};
pub use viewer::{AdmissionError, AdmissionPolicy, Subscription, ViewerId};
