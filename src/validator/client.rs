// src/validator/client.rs

use super::model::JsonWebKeySet;
use crate::error::VerifierError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Source of the remote signing key set.
///
/// The verifier only depends on this trait, so tests can count and script
/// fetches without a network.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    async fn fetch(&self) -> Result<JsonWebKeySet, VerifierError>;
}

/// Fetches the JWKS document from the auth provider over HTTPS.
#[derive(Clone)]
pub struct JwksClient {
    http_client: reqwest::Client,
    jwks_uri: Option<Url>,
    timeout: Duration,
}

impl JwksClient {
    /// Creates a new `JwksClient`. A `None` URI is accepted here and reported
    /// as [`VerifierError::ServerMisconfigured`] on the first fetch.
    pub fn new(http_client: reqwest::Client, jwks_uri: Option<Url>, timeout: Duration) -> Self {
        Self { http_client, jwks_uri, timeout }
    }
}

#[async_trait]
impl KeySetFetcher for JwksClient {
    #[instrument(skip(self), err)]
    async fn fetch(&self) -> Result<JsonWebKeySet, VerifierError> {
        let jwks_uri = self.jwks_uri.as_ref().ok_or_else(|| {
            VerifierError::ServerMisconfigured("SUPABASE_JWKS_URL is missing".to_string())
        })?;

        let jwks: JsonWebKeySet = self
            .http_client
            .get(jwks_uri.clone())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(keys = jwks.keys.len(), "Fetched signing key set");
        Ok(jwks)
    }
}
