// src/validator.rs

pub mod cache;
pub mod client;
pub mod model;

use crate::config::{Config, ValidationDetails};
use crate::error::VerifierError;
use cache::{KeySetCache, SystemClock};
use client::JwksClient;
use jsonwebtoken::{decode, decode_header, Validation};
use model::VerifiedIdentity;
use std::sync::Arc;
use tracing::instrument;

type ClaimSet = serde_json::Map<String, serde_json::Value>;

/// Extracts the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively and the token is trimmed. An absent
/// header, another scheme, or an empty token is a [`VerifierError::MissingCredential`].
pub fn bearer_token(header: Option<&str>) -> Result<&str, VerifierError> {
    let header = header.ok_or(VerifierError::MissingCredential)?;
    match header.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => {
            let token = header[7..].trim();
            if token.is_empty() {
                Err(VerifierError::MissingCredential)
            } else {
                Ok(token)
            }
        }
        _ => Err(VerifierError::MissingCredential),
    }
}

/// Resolves bearer tokens to verified identities.
///
/// Create it once at startup and share it; the key set cache inside is
/// process-wide.
pub struct TokenVerifier {
    keys: KeySetCache,
    validation: ValidationDetails,
}

impl TokenVerifier {
    pub fn new(keys: KeySetCache, validation: ValidationDetails) -> Self {
        Self { keys, validation }
    }

    /// Wires the HTTPS key set client and the system clock from `config`.
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let fetcher = JwksClient::new(
            http_client,
            config.key_set.jwks_uri.clone(),
            config.key_set.fetch_timeout,
        );
        let keys = KeySetCache::new(
            Arc::new(fetcher),
            Arc::new(SystemClock),
            config.key_set.freshness_window,
        );
        Self::new(keys, config.validation.clone())
    }

    /// Validates the raw `Authorization` header and returns the caller's identity.
    pub async fn resolve_identity(&self, authorization: Option<&str>) -> Result<VerifiedIdentity, VerifierError> {
        let token = bearer_token(authorization)?;
        self.verify(token).await
    }

    /// Verifies a bare token.
    ///
    /// 1. Reads `kid` from the unverified header.
    /// 2. Resolves the key through the cache (with one forced refresh on a miss).
    /// 3. Checks signature and time claims. Audience is not checked.
    /// 4. Requires a non-empty `sub`.
    #[instrument(skip(self, token), err)]
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifierError> {
        let header = decode_header(token).map_err(|e| VerifierError::MalformedToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| VerifierError::MalformedToken("token header has no 'kid'".to_string()))?;

        let key = self.keys.key_for(&kid).await?;

        let mut validation = Validation::new(self.validation.algorithm);
        validation.leeway = self.validation.leeway.as_secs();
        // Tokens come from a single first-party client; the audience is not enforced.
        validation.validate_aud = false;

        let token_data = decode::<ClaimSet>(token, &key, &validation)?;
        VerifiedIdentity::from_claims(token_data.claims).ok_or(VerifierError::InvalidPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::cache::tests::{ManualClock, ScriptedFetcher};
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::Duration;

    fn verifier_with(fetcher: Arc<ScriptedFetcher>) -> TokenVerifier {
        let keys = KeySetCache::new(fetcher, Arc::new(ManualClock::new()), Duration::from_secs(600));
        TokenVerifier::new(keys, ValidationDetails::default())
    }

    fn hs256_token(kid: Option<&str>) -> String {
        let mut header = Header::new(jsonwebtoken::Algorithm::HS256);
        header.kid = kid.map(str::to_string);
        let claims = serde_json::json!({ "sub": "abc", "exp": 4_102_444_800u64 });
        encode(&header, &claims, &EncodingKey::from_secret(b"not-the-provider")).unwrap()
    }

    #[test]
    fn test_bearer_token_accepts_any_scheme_case() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("BEARER   abc  ")).unwrap(), "abc");
    }

    #[test]
    fn test_bearer_token_rejects_missing_or_malformed_headers() {
        for header in [None, Some(""), Some("Bearer"), Some("Bearer "), Some("Bearer    "), Some("Basic abc"), Some("Token abc"), Some("Bearerabc"), Some("ñññ")] {
            assert!(
                matches!(bearer_token(header), Err(VerifierError::MissingCredential)),
                "expected MissingCredential for {header:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_header_never_fetches() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![vec!["k1"]]));
        let verifier = verifier_with(fetcher.clone());

        let result = verifier.resolve_identity(None).await;
        assert!(matches!(result, Err(VerifierError::MissingCredential)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_token_without_kid_is_malformed() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![vec!["k1"]]));
        let verifier = verifier_with(fetcher.clone());

        let header = format!("Bearer {}", hs256_token(None));
        let result = verifier.resolve_identity(Some(&header)).await;
        assert!(matches!(result, Err(VerifierError::MalformedToken(_))));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_token_is_malformed() {
        let verifier = verifier_with(Arc::new(ScriptedFetcher::new(vec![vec!["k1"]])));

        for token in ["not-a-jwt", "a.b", "!!!.@@@.###"] {
            let result = verifier.verify(token).await;
            assert!(matches!(result, Err(VerifierError::MalformedToken(_))), "token {token}");
        }
    }

    #[tokio::test]
    async fn test_unknown_kid_fails_after_one_forced_refresh() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![vec!["k1"]]));
        let verifier = verifier_with(fetcher.clone());

        let result = verifier.verify(&hs256_token(Some("rotated-away"))).await;
        assert!(matches!(result, Err(VerifierError::UnknownSigningKey(_))));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_wrong_algorithm_is_invalid_credential() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![vec!["k1"]]));
        let verifier = verifier_with(fetcher);

        let result = verifier.verify(&hs256_token(Some("k1"))).await;
        assert!(matches!(result, Err(VerifierError::InvalidCredential(_))));
    }
}
