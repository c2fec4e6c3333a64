//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CatcherConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CatcherConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("root_host must not be empty")]
    EmptyRootHost,

    #[error("admin.password must be set when admin is enabled")]
    MissingAdminPassword,
}

pub fn validate_config(config: &CatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(tls) = &config.listener.tls {
        check_address(&mut errors, "listener.tls.bind_address", &tls.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.root_host.trim().is_empty() {
        errors.push(ValidationError::EmptyRootHost);
    }
    if config.capture.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "capture.max_body_bytes" });
    }
    if config.viewer.send_buffer_size == 0 {
        errors.push(ValidationError::Zero { field: "viewer.send_buffer_size" });
    }
    if config.viewer.write_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "viewer.write_timeout_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.admin.enabled && config.admin.password.is_empty() {
        errors.push(ValidationError::MissingAdminPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
