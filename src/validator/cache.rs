// src/validator/cache.rs

use super::client::KeySetFetcher;
use super::model::JsonWebKeySet;
use crate::error::VerifierError;
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Time source for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// One fetched generation of verification keys, indexed by `kid`.
///
/// A set is never updated in place; a refresh replaces it wholesale.
pub struct SigningKeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Instant,
}

impl SigningKeySet {
    /// Builds decoding keys for every usable RSA entry of `jwks`. Entries without
    /// a `kid`, of another key type, or with broken components are skipped.
    pub fn from_jwks(jwks: JsonWebKeySet, fetched_at: Instant) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());
        for jwk in jwks.keys {
            let Some(kid) = jwk.kid else {
                debug!("Skipping JWK without a kid");
                continue;
            };
            if jwk.kty != "RSA" {
                debug!(kid = %kid, kty = %jwk.kty, "Skipping non-RSA JWK");
                continue;
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                warn!(kid = %kid, "RSA JWK is missing its 'n' or 'e' component");
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => {
                    keys.insert(kid, Arc::new(key));
                }
                Err(err) => warn!(kid = %kid, error = %err, "Invalid RSA JWK components"),
            }
        }
        Self { keys, fetched_at }
    }

    pub fn get(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys.get(kid).cloned()
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// A set is fresh strictly before `fetched_at + window`.
    pub fn is_fresh(&self, now: Instant, window: Duration) -> bool {
        now < self.fetched_at + window
    }
}

/// Time-boxed cache over a remote signing key set with a single rotation retry.
///
/// Refreshes are single-flight: concurrent misses queue on one lock and the
/// waiters reuse the set fetched by whoever went first.
pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    current: RwLock<Option<Arc<SigningKeySet>>>,
    refresh_lock: Mutex<()>,
}

impl KeySetCache {
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, clock: Arc<dyn Clock>, freshness_window: Duration) -> Self {
        Self {
            fetcher,
            clock,
            freshness_window,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Resolves the verification key for `kid`.
    ///
    /// Uses the cached set while it is fresh and fetches otherwise. When the
    /// key is not in that set, the set is re-fetched exactly once regardless
    /// of freshness before giving up with [`VerifierError::UnknownSigningKey`].
    pub async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, VerifierError> {
        let set = self.fresh_or_refreshed().await?;
        if let Some(key) = set.get(kid) {
            debug!(kid = %kid, "JWK cache hit");
            return Ok(key);
        }

        debug!(kid = %kid, "Key not in current set, forcing a refresh for key rotation");
        let set = self.force_refresh(&set).await?;
        set.get(kid)
            .ok_or_else(|| VerifierError::UnknownSigningKey(kid.to_string()))
    }

    async fn fresh_set(&self) -> Option<Arc<SigningKeySet>> {
        let now = self.clock.now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|set| set.is_fresh(now, self.freshness_window))
            .cloned()
    }

    async fn fresh_or_refreshed(&self) -> Result<Arc<SigningKeySet>, VerifierError> {
        if let Some(set) = self.fresh_set().await {
            return Ok(set);
        }

        let _guard = self.refresh_lock.lock().await;
        // Someone else may have refreshed while we waited for the lock.
        if let Some(set) = self.fresh_set().await {
            return Ok(set);
        }
        self.refresh().await
    }

    async fn force_refresh(&self, seen: &Arc<SigningKeySet>) -> Result<Arc<SigningKeySet>, VerifierError> {
        let _guard = self.refresh_lock.lock().await;
        if let Some(current) = self.current.read().await.as_ref() {
            if !Arc::ptr_eq(current, seen) {
                return Ok(Arc::clone(current));
            }
        }
        self.refresh().await
    }

    /// Fetches a new set and replaces the cached one. Callers hold `refresh_lock`.
    async fn refresh(&self) -> Result<Arc<SigningKeySet>, VerifierError> {
        let started = self.clock.now();
        let jwks = self.fetcher.fetch().await?;
        let set = Arc::new(SigningKeySet::from_jwks(jwks, started));
        debug!(keys = set.len(), "Signing key set refreshed");
        *self.current.write().await = Some(Arc::clone(&set));
        Ok(set)
    }
}
