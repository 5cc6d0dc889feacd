// src/routes/files.rs

use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use super::parse_body;
use crate::auth::AuthUser;
use crate::error::{AppError, StorageError};
use crate::storage::{ensure_owned_path, ensure_valid_bucket, SignedUpload};
use crate::AppState;

#[derive(Deserialize)]
struct SignedUploadRequest {
    #[serde(default = "default_bucket")]
    bucket: String,
    path: String,
    #[serde(default)]
    content_type: Option<String>,
}

fn default_bucket() -> String {
    "files".to_string()
}

/// POST /files/signed-upload
pub async fn signed_upload(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: Bytes,
) -> Result<Json<SignedUpload>, AppError> {
    let request: SignedUploadRequest = parse_body(&body)?;
    ensure_valid_bucket(&request.bucket)?;
    ensure_owned_path(&identity.subject, &request.path)?;

    let storage = state.storage.as_ref().ok_or_else(|| {
        StorageError::NotConfigured("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY is missing".to_string())
    })?;

    debug!(bucket = %request.bucket, content_type = ?request.content_type, "Creating signed upload");
    let upload = storage.create_signed_upload(&request.bucket, &request.path).await?;
    Ok(Json(upload))
}
