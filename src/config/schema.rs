//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the catcher.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the request catcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatcherConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Host serving the marketing/root page instead of the tenant index page.
    pub root_host: String,

    /// Allow more than one simultaneous viewer per tenant.
    pub allow_multiple: bool,

    /// Capture settings.
    pub capture: CaptureConfig,

    /// Viewer connection settings.
    pub viewer: ViewerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static frontend location.
    pub frontend: FrontendConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints on the root host.
    pub admin: AdminConfig,
}

impl Default for CatcherConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            root_host: "requestcatcher.com".to_string(),
            allow_multiple: false,
            capture: CaptureConfig::default(),
            viewer: ViewerConfig::default(),
            timeouts: TimeoutConfig::default(),
            frontend: FrontendConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address for plain HTTP (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional additional TLS listener.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Bind address for HTTPS (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Capture settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Largest body kept per caught request; the rest is cut off.
    pub max_body_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Viewer connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Outbound queue depth per viewer. A viewer that falls this far behind
    /// is disconnected.
    pub send_buffer_size: usize,

    /// Longest a single frame write may block before the viewer is dropped,
    /// in seconds.
    pub write_timeout_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            send_buffer_size: 256,
            write_timeout_secs: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight connections on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Static frontend location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Directory holding `favicon.ico` and the built `dist/` tree.
    pub dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("frontend"),
        }
    }
}

impl FrontendConfig {
    pub fn dist_dir(&self) -> PathBuf {
        self.dir.join("dist")
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin endpoints configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/admin/*` on the root host.
    pub enabled: bool,

    /// Basic auth user name.
    pub user: String,

    /// Basic auth password. Overridden by `CATCHER_ADMIN_PASSWORD`.
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            user: "admin".to_string(),
            password: String::new(),
        }
    }
}
