//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::CatcherConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `admin.password`.
pub const ADMIN_PASSWORD_ENV: &str = "CATCHER_ADMIN_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CatcherConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, std::env::var(ADMIN_PASSWORD_ENV).ok())
}

/// Parse and validate configuration text, applying the admin password override.
pub fn parse_config(
    content: &str,
    admin_password: Option<String>,
) -> Result<CatcherConfig, ConfigError> {
    let mut config: CatcherConfig = toml::from_str(content)?;
    if let Some(password) = admin_password.filter(|p| !p.is_empty()) {
        config.admin.password = password;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
