//! Relay request shape and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message forwarded to the chat backend.
///
/// Both fields are passed through as-is; the relay does not interpret them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub attachment: serde_json::Value,
}

/// Errors that can occur while relaying to the backend.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The backend refused the connection (not running).
    #[error("Chat backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered with a non-success status.
    #[error("Chat backend returned status {status}")]
    Status { status: u16 },

    /// Any other transport or decoding failure.
    #[error("Chat backend error: {0}")]
    Backend(String),
}

impl ChatError {
    /// True when the backend is not running, as opposed to misbehaving.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ChatError::BackendUnavailable(_))
    }
}

/// Result type for relay operations.
pub type ChatResult<T> = Result<T, ChatError>;
