mod common;

use common::{claims_for, TestSigner};
use serde_json::json;
use std::time::Duration;
use uniai_bff::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn verifier_for(server: &MockServer) -> TokenVerifier {
    let config = ConfigBuilder::new()
        .jwks_uri(&format!("{}/auth/v1/.well-known/jwks.json", server.uri()))
        .unwrap()
        .build()
        .unwrap();
    TokenVerifier::from_config(&config, reqwest::Client::new())
}

async fn mount_jwks(server: &MockServer, body: serde_json::Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_valid_token_resolves_identity_end_to_end() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let verifier = verifier_for(&server);
    let header = format!("Bearer {}", signer.token("k1"));
    let identity = verifier.resolve_identity(Some(&header)).await.unwrap();

    assert_eq!(identity.subject, "abc");
    assert_eq!(identity.email, None);
    assert_eq!(identity.claims["role"], "authenticated");
}

#[tokio::test]
async fn test_email_claim_is_passed_through() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let mut claims = claims_for("user-7", 3600);
    claims["email"] = json!("student@uni.edu");
    let identity = verifier_for(&server).verify(&signer.sign("k1", &claims)).await.unwrap();

    assert_eq!(identity.subject, "user-7");
    assert_eq!(identity.email.as_deref(), Some("student@uni.edu"));
}

#[tokio::test]
async fn test_fresh_key_set_is_reused_across_requests() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let verifier = verifier_for(&server);
    for _ in 0..3 {
        verifier.verify(&signer.token("k1")).await.unwrap();
    }
}

#[tokio::test]
async fn test_rotated_key_is_picked_up_with_one_refetch() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    // First fetch only knows the old key; the forced refetch sees the new one.
    Mock::given(method("GET"))
        .and(path("/auth/v1/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signer.jwks(&["old"])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_jwks(&server, signer.jwks(&["old", "new"]), 1).await;

    let verifier = verifier_for(&server);
    verifier.verify(&signer.token("old")).await.unwrap();
    let identity = verifier.verify(&signer.token("new")).await.unwrap();
    assert_eq!(identity.subject, "abc");
}

#[tokio::test]
async fn test_unknown_kid_fails_after_exactly_two_fetches() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 2).await;

    let result = verifier_for(&server).verify(&signer.token("ghost")).await;

    assert!(matches!(result, Err(VerifierError::UnknownSigningKey(ref kid)) if kid == "ghost"));
    assert_eq!(result.unwrap_err().rejection(), Rejection::InvalidCredential);
}

#[tokio::test]
async fn test_token_without_subject_is_invalid_payload() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let mut claims = claims_for("ignored", 3600);
    claims.as_object_mut().unwrap().remove("sub");
    let result = verifier_for(&server).verify(&signer.sign("k1", &claims)).await;

    assert!(matches!(result, Err(VerifierError::InvalidPayload)));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    // Well past the 60 second leeway.
    let token = signer.sign("k1", &claims_for("abc", -3600));
    let result = verifier_for(&server).verify(&token).await;

    assert!(matches!(result, Err(VerifierError::InvalidCredential(_))));
}

#[tokio::test]
async fn test_token_inside_leeway_is_accepted() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let token = signer.sign("k1", &claims_for("abc", -10));
    assert!(verifier_for(&server).verify(&token).await.is_ok());
}

#[tokio::test]
async fn test_tampered_signature_is_rejected() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 1).await;

    let token = signer.token("k1");
    let (unsigned, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{unsigned}.{flipped}{}", &signature[1..]);

    let result = verifier_for(&server).verify(&tampered).await;
    assert!(matches!(result, Err(VerifierError::InvalidCredential(_))));
}

#[tokio::test]
async fn test_key_set_outage_is_an_invalid_credential() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = verifier_for(&server).verify(&signer.token("k1")).await;

    assert!(matches!(result, Err(VerifierError::KeySetUnavailable(_))));
    assert_eq!(result.unwrap_err().rejection(), Rejection::InvalidCredential);
}

#[tokio::test]
async fn test_missing_jwks_url_is_a_server_misconfiguration() {
    let signer = TestSigner::new();
    let config = ConfigBuilder::new().build().unwrap();
    let verifier = TokenVerifier::from_config(&config, reqwest::Client::new());

    let header = format!("Bearer {}", signer.token("k1"));
    let result = verifier.resolve_identity(Some(&header)).await;

    assert_eq!(result.unwrap_err().rejection(), Rejection::ServerMisconfigured);
}

#[tokio::test]
async fn test_stale_key_set_is_refetched() {
    let signer = TestSigner::new();
    let server = MockServer::start().await;
    mount_jwks(&server, signer.jwks(&["k1"]), 2).await;

    let config = ConfigBuilder::new()
        .jwks_uri(&format!("{}/auth/v1/.well-known/jwks.json", server.uri()))
        .unwrap()
        .freshness_window(Duration::from_millis(50))
        .build()
        .unwrap();
    let verifier = TokenVerifier::from_config(&config, reqwest::Client::new());

    verifier.verify(&signer.token("k1")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    verifier.verify(&signer.token("k1")).await.unwrap();
}
