//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the upload relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upload directory settings.
    pub storage: StorageConfig,

    /// Chat backend relay settings.
    pub chat: ChatConfig,

    /// Static asset serving.
    pub static_files: StaticFilesConfig,

    /// Shutdown sequencing.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// How an upload's on-disk name is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Store under the caller-supplied name, after single-segment validation.
    #[default]
    Original,
    /// Store under a timestamped, randomized, encoded name.
    Sanitized,
}

/// Upload directory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding all uploaded files.
    pub upload_dir: String,

    /// Naming policy for new uploads.
    pub naming: NamingPolicy,

    /// Maximum accepted request body for uploads, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "uploads".to_string(),
            naming: NamingPolicy::Original,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Chat backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Full URL of the backend chat endpoint.
    pub backend_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8501/api/chat".to_string(),
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory of front-end assets served at `/`.
    pub public_dir: String,

    /// URL prefix under which uploaded files are served read-only.
    pub uploads_prefix: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            uploads_prefix: "/uploads".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight requests after the listener closes.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Address of the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
