// src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

/// Errors raised while building a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provided URL could not be parsed.
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors produced while resolving a bearer credential into a verified identity.
///
/// The variants keep the internal cause distinct. Use [`VerifierError::rejection`]
/// to collapse them into what a caller is allowed to learn.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The `Authorization` header is absent, not a `Bearer` credential, or empty.
    #[error("Missing or malformed bearer credential")]
    MissingCredential,

    /// The token could not be parsed, or its header carries no `kid`.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The deployment is missing something the verifier needs, e.g. the JWKS endpoint.
    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),

    /// No key with this `kid` exists, even after a forced key set refresh.
    #[error("Key not found for kid: {0}")]
    UnknownSigningKey(String),

    /// The key set endpoint could not be reached or returned an unusable document.
    #[error("Signing key set unavailable: {0}")]
    KeySetUnavailable(#[from] reqwest::Error),

    /// Signature, expiry, or claim validation failed.
    #[error("JWT validation error: {0}")]
    InvalidCredential(#[from] jsonwebtoken::errors::Error),

    /// The token verified but does not name a subject.
    #[error("The verified token carries no subject claim")]
    InvalidPayload,
}

/// The externally visible classification of a [`VerifierError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingCredential,
    InvalidCredential,
    InvalidPayload,
    ServerMisconfigured,
}

impl VerifierError {
    /// Collapses the internal cause into the classification shown to callers.
    pub fn rejection(&self) -> Rejection {
        match self {
            VerifierError::MissingCredential => Rejection::MissingCredential,
            VerifierError::MalformedToken(_)
            | VerifierError::UnknownSigningKey(_)
            | VerifierError::KeySetUnavailable(_)
            | VerifierError::InvalidCredential(_) => Rejection::InvalidCredential,
            VerifierError::InvalidPayload => Rejection::InvalidPayload,
            VerifierError::ServerMisconfigured(_) => Rejection::ServerMisconfigured,
        }
    }
}

/// Failures talking to the completion model. These never leave the `ai` module:
/// the tutor turns each of them into a fallback value.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Completion API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No API key configured for the completion service")]
    MissingApiKey,
}

/// Errors from the signed-upload flow.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path must start with '{0}/'")]
    ForeignPath(String),

    #[error("path must not contain '.' or '..' segments")]
    PathTraversal,

    #[error("invalid bucket name '{0}'")]
    InvalidBucket(String),

    #[error("Server misconfigured: {0}")]
    NotConfigured(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object storage returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Object storage response did not contain a signed URL")]
    MissingSignedUrl,
}

/// Error type rendered by the HTTP layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] VerifierError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error_type) = match &self {
            AppError::Auth(e) => match e.rejection() {
                Rejection::MissingCredential => (
                    StatusCode::UNAUTHORIZED,
                    "Missing bearer token".to_string(),
                    "unauthorized",
                ),
                Rejection::InvalidCredential => {
                    warn!(error = %e, "Rejected bearer token");
                    (
                        StatusCode::UNAUTHORIZED,
                        "Invalid token".to_string(),
                        "unauthorized",
                    )
                }
                Rejection::InvalidPayload => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid token payload".to_string(),
                    "unauthorized",
                ),
                Rejection::ServerMisconfigured => {
                    error!(error = %e, "Token verification is misconfigured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server misconfigured".to_string(),
                        "server_error",
                    )
                }
            },
            AppError::Storage(e) => match e {
                StorageError::ForeignPath(_) | StorageError::PathTraversal | StorageError::InvalidBucket(_) => {
                    (StatusCode::BAD_REQUEST, e.to_string(), "bad_request")
                }
                StorageError::NotConfigured(_) => {
                    error!(error = %e, "Object storage is misconfigured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server misconfigured".to_string(),
                        "server_error",
                    )
                }
                _ => {
                    error!(error = %e, "Signed upload request failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Could not create signed upload URL".to_string(),
                        "upstream_error",
                    )
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "bad_request"),
            AppError::Internal(e) => {
                error!(error = %e, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "server_error",
                )
            }
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
