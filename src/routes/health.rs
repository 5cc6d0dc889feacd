// src/routes/health.rs

use axum::response::IntoResponse;
use axum::Json;

use crate::auth::AuthUser;

/// GET /health → {"status": "ok"}
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /me → the verified caller
pub async fn me(AuthUser(identity): AuthUser) -> impl IntoResponse {
    Json(serde_json::json!({
        "id": identity.subject,
        "email": identity.email,
    }))
}
