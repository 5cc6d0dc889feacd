// src/auth.rs

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::validator::model::VerifiedIdentity;
use crate::AppState;

/// Extractor that resolves the bearer token into the caller's identity.
/// Use as a handler parameter to require auth on a route.
pub struct AuthUser(pub VerifiedIdentity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A header that is not valid visible ASCII is treated like a missing one.
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let identity = state.verifier.resolve_identity(header).await?;
        Ok(AuthUser(identity))
    }
}
