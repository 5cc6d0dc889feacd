// src/validator/model.rs

use serde::{Deserialize, Serialize};

/// Represents a single JSON Web Key (JWK) as defined in RFC 7517.
///
/// Only the members needed to build an RS256 verification key are kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonWebKey {
    pub kid: Option<String>,
    pub kty: String,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub alg: Option<String>,
    pub n: Option<String>,
    pub e: Option<String>,
}

/// Represents a JSON Web Key Set (JWKS), which is a collection of JWKs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonWebKeySet {
    #[serde(default)]
    pub keys: Vec<JsonWebKey>,
}

/// The identity behind a successfully verified bearer token.
///
/// Lives for one request and is never persisted by the verifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedIdentity {
    /// The `sub` claim. Always non-empty.
    pub subject: String,
    /// The `email` claim when present, passed through unvalidated.
    pub email: Option<String>,
    /// Every claim of the verified payload.
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl VerifiedIdentity {
    /// Builds an identity from a verified claim set. Returns `None` when the
    /// subject is missing, not a string, or empty.
    pub fn from_claims(claims: serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let subject = claims
            .get("sub")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())?
            .to_string();
        let email = claims.get("email").and_then(|v| v.as_str()).map(str::to_string);
        Some(Self { subject, email, claims })
    }
}
