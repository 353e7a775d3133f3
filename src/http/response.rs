//! Error responses for the HTTP API.
//!
//! Every failure is rendered as `{"error": "<message>"}`. Server-side
//! failures are logged here with their cause and answered with a generic
//! message, so filesystem paths never leak to clients.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::chat::ChatError;
use crate::storage::StoreError;

/// A per-request failure. Never escalates beyond the request.
#[derive(Debug)]
pub enum ApiError {
    /// Listing the upload directory failed.
    List(StoreError),
    /// Deleting a file failed.
    Delete(StoreError),
    /// Writing an upload failed.
    Upload(StoreError),
    /// The upload request carried no files.
    NoFiles,
    /// A file arrived under a field other than `files`.
    UnexpectedField(String),
    /// The multipart body could not be parsed or exceeded the body limit.
    Multipart(MultipartError),
    /// Relaying to the chat backend failed.
    Chat(ChatError),
}

impl ApiError {
    /// HTTP status and client-facing message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::List(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list files".to_string(),
            ),
            ApiError::Delete(StoreError::InvalidName(name))
            | ApiError::Upload(StoreError::InvalidName(name)) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid file name '{}'", name),
            ),
            ApiError::Delete(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete file".to_string(),
            ),
            ApiError::Upload(StoreError::Sealed) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Server is shutting down".to_string(),
            ),
            ApiError::Upload(StoreError::Stream { source, .. }) => {
                match source.downcast_ref::<MultipartError>() {
                    Some(e) => (e.status(), e.body_text()),
                    None => (
                        StatusCode::BAD_REQUEST,
                        format!("Upload interrupted: {}", source),
                    ),
                }
            }
            ApiError::Upload(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store file".to_string(),
            ),
            ApiError::NoFiles => (
                StatusCode::BAD_REQUEST,
                "No files were uploaded".to_string(),
            ),
            ApiError::UnexpectedField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Unexpected file field '{}'", field),
            ),
            ApiError::Multipart(e) => (e.status(), e.body_text()),
            ApiError::Chat(ChatError::BackendUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Cannot connect to the chat backend".to_string(),
            ),
            ApiError::Chat(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = ?self, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
