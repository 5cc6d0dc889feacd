// src/storage.rs

use crate::config::StorageConfig;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

/// Checks that `path` lives under the caller's own `{user_id}/` prefix.
pub fn ensure_owned_path(user_id: &str, path: &str) -> Result<(), StorageError> {
    let prefix = format!("{user_id}/");
    if !path.starts_with(&prefix) || path.len() == prefix.len() {
        return Err(StorageError::ForeignPath(user_id.to_string()));
    }
    // `Url` collapses dot segments when the endpoint is built.
    if path.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(StorageError::PathTraversal);
    }
    Ok(())
}

/// Bucket names are limited to ASCII letters, digits, `-` and `_`.
pub fn ensure_valid_bucket(bucket: &str) -> Result<(), StorageError> {
    let valid = !bucket.is_empty()
        && bucket.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidBucket(bucket.to_string()))
    }
}

/// A one-shot upload URL issued by the object store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedUpload {
    pub bucket: String,
    pub path: String,
    pub signed_url: String,
    pub token: Option<String>,
}

#[derive(Deserialize)]
struct SignResponse {
    url: Option<String>,
}

/// Client for the storage API of the backing project.
#[derive(Clone)]
pub struct ObjectStorage {
    http_client: reqwest::Client,
    config: StorageConfig,
}

impl ObjectStorage {
    pub fn new(http_client: reqwest::Client, config: StorageConfig) -> Self {
        Self { http_client, config }
    }

    fn api_base(&self) -> String {
        format!("{}/storage/v1", self.config.project_url.as_str().trim_end_matches('/'))
    }

    fn sign_endpoint(&self, bucket: &str, path: &str) -> Result<Url, StorageError> {
        ensure_valid_bucket(bucket)?;
        let mut url = self.config.project_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::NotConfigured("SUPABASE_URL cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", "upload", "sign", bucket])
            .extend(path.split('/'));
        Ok(url)
    }

    /// Asks the object store for a signed upload URL for `bucket/path`.
    ///
    /// The caller is responsible for checking path ownership first.
    #[instrument(skip(self), err)]
    pub async fn create_signed_upload(&self, bucket: &str, path: &str) -> Result<SignedUpload, StorageError> {
        let endpoint = self.sign_endpoint(bucket, path)?;
        let response = self
            .http_client
            .post(endpoint)
            .bearer_auth(&self.config.service_role_key)
            .header("apikey", &self.config.service_role_key)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status { status: status.as_u16(), body });
        }

        let relative = response
            .json::<SignResponse>()
            .await?
            .url
            .filter(|u| !u.is_empty())
            .ok_or(StorageError::MissingSignedUrl)?;

        let signed_url = format!("{}{}", self.api_base(), relative);
        let token = Url::parse(&signed_url)
            .map_err(|_| StorageError::MissingSignedUrl)?
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned());

        debug!(bucket, path, has_token = token.is_some(), "Signed upload URL issued");
        Ok(SignedUpload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            signed_url,
            token,
        })
    }
}
