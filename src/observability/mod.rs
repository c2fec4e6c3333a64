//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (host, viewer) on every catcher event
//! - Request ID flows through the HTTP trace spans
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
