//! API handlers: thin adapters from HTTP onto the store and the chat relay.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::chat::ChatRequest;
use crate::config::NamingPolicy;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::storage::sanitize_file_name;

/// Multipart field that carries uploaded files.
pub const UPLOAD_FIELD: &str = "files";

/// One entry of the upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name supplied by the client.
    pub originalname: String,
    /// Name on disk.
    pub filename: String,
    /// URL path the file is served under.
    pub path: String,
}

/// `GET /api/files`
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let names = state.store.list().await.map_err(ApiError::List)?;
    Ok(Json(names))
}

/// `DELETE /api/files/{filename}`
pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .store
        .remove(&filename)
        .await
        .map_err(ApiError::Delete)?;
    tracing::info!(filename = %filename, "File deleted");
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/upload`
///
/// Streams every file part of field `files` to disk. Text parts are ignored.
/// If any file fails, the files already written by this request are removed.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    let mut uploaded: Vec<UploadedFile> = Vec::new();

    let outcome = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(ApiError::Multipart)?
        {
            let Some(original) = field.file_name().map(str::to_owned) else {
                continue;
            };
            let field_name = field.name().unwrap_or_default().to_owned();
            if field_name != UPLOAD_FIELD {
                return Err(ApiError::UnexpectedField(field_name));
            }

            let stored_name = match state.naming {
                NamingPolicy::Original => original.clone(),
                NamingPolicy::Sanitized => sanitize_file_name(&original),
            };
            let stored = state
                .store
                .add_stream(&stored_name, field)
                .await
                .map_err(ApiError::Upload)?;

            uploaded.push(UploadedFile {
                path: format!("{}/{}", state.uploads_prefix, stored.stored_name),
                originalname: original,
                filename: stored.stored_name,
            });
        }
        Ok::<(), ApiError>(())
    }
    .await;

    if let Err(e) = outcome {
        for file in &uploaded {
            if let Err(cleanup) = state.store.remove(&file.filename).await {
                tracing::warn!(filename = %file.filename, error = %cleanup, "Failed to roll back upload");
            }
        }
        return Err(e);
    }

    if uploaded.is_empty() {
        return Err(ApiError::NoFiles);
    }

    tracing::info!(
        count = uploaded.len(),
        files = ?uploaded.iter().map(|f| f.filename.as_str()).collect::<Vec<_>>(),
        "Files uploaded"
    );
    Ok(Json(uploaded))
}

/// `POST /api/send-message`
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!(message = %request.message, "Received message");
    let reply = state.chat.send(&request).await.map_err(ApiError::Chat)?;
    Ok(Json(reply))
}
