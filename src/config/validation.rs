//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! Validation is a pure function that reports every problem, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.storage.upload_dir.trim().is_empty() {
        errors.push(ValidationError::new("storage.upload_dir", "must not be empty"));
    }

    if config.storage.max_upload_bytes == 0 {
        errors.push(ValidationError::new(
            "storage.max_upload_bytes",
            "must be greater than zero",
        ));
    }

    match url::Url::parse(&config.chat.backend_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "chat.backend_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "chat.backend_url",
            format!("'{}' is not a valid URL: {}", config.chat.backend_url, e),
        )),
    }

    let prefix = &config.static_files.uploads_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "static_files.uploads_prefix",
            format!("'{}' must look like '/name'", prefix),
        ));
    } else if prefix == "/api" || prefix.starts_with("/api/") {
        errors.push(ValidationError::new(
            "static_files.uploads_prefix",
            "must not shadow the /api routes",
        ));
    }

    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::new(
            "shutdown.grace_period_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
