// src/lib.rs

use std::sync::Arc;

use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod storage;
pub mod validator;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<validator::TokenVerifier>,
    pub tutor: Arc<ai::Tutor>,
    /// `None` when no storage project is configured.
    pub storage: Option<Arc<storage::ObjectStorage>>,
}

impl AppState {
    /// Wires the production collaborators from `config`, sharing one HTTP client.
    pub fn from_config(config: &config::Config, http_client: reqwest::Client) -> Self {
        let verifier = validator::TokenVerifier::from_config(config, http_client.clone());
        let model = ai::client::OpenAiCompatClient::new(http_client.clone(), &config.llm);
        let storage = config
            .storage
            .clone()
            .map(|s| Arc::new(storage::ObjectStorage::new(http_client, s)));

        Self {
            verifier: Arc::new(verifier),
            tutor: Arc::new(ai::Tutor::new(Arc::new(model))),
            storage,
        }
    }
}

/// Request ID middleware: generates or passes through X-Request-ID header.
pub async fn request_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Store in request extensions for handlers
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", val);
    }
    response
}

/// The full application: routes, middleware and state.
pub fn build_app(state: AppState) -> Router {
    routes::build_router()
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// The public prelude for the `uniai-bff` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::ai::model::{AnalysisResult, ChatKind, ChatReply, Outcome, Priority};
    pub use crate::ai::{estimate_difficulty_priority, Tutor};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::{AppError, Rejection, VerifierError};
    pub use crate::validator::model::VerifiedIdentity;
    pub use crate::validator::TokenVerifier;
    pub use crate::{build_app, AppState};
    pub use jsonwebtoken::Algorithm;
}
