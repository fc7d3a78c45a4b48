//! Signature verification for claims tokens against a published JSON Web Key Set.
//!
//! Only used when a key-set URL is configured. The set is fetched lazily,
//! cached, and refreshed when it goes stale or when a token names a key id
//! we have not seen (rotation). One fetch runs at a time, and the endpoint
//! is contacted at most once per `MIN_REFRESH_INTERVAL` outside the normal
//! TTL expiry, whether or not the previous attempt succeeded.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    jwk::{Jwk, JwkSet},
};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;
use url::Url;

use crate::services::auth::AuthError;

const KEY_SET_TTL: Duration = Duration::from_secs(300);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedKeySet {
    fetched_at: Instant,
    keys: Arc<JwkSet>,
}

#[derive(Debug, Default)]
struct KeySetState {
    current: Option<CachedKeySet>,
    // successful or not; bounds how often the endpoint is hit
    last_attempt: Option<Instant>,
}

#[derive(Debug)]
pub struct KeySetCache {
    url: Url,
    client: reqwest::Client,
    state: RwLock<KeySetState>,
    // single-flight: at most one fetch in progress
    refresh: Mutex<()>,
}

impl KeySetCache {
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        Self {
            url,
            client,
            state: RwLock::new(KeySetState::default()),
            refresh: Mutex::new(()),
        }
    }

    /// Check the token signature. Claims are validated elsewhere.
    pub async fn verify(&self, token: &str) -> Result<(), AuthError> {
        let header = decode_header(token).map_err(|e| {
            warn!(error = %e, "claims token header is not decodable");
            AuthError::SignatureInvalid
        })?;

        // A public key set never legitimately signs with a shared secret.
        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            warn!(alg = ?header.alg, "symmetric alg rejected for claims token");
            return Err(AuthError::SignatureInvalid);
        }

        let jwk = self.find_key(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            warn!(error = %e, kid = ?header.kid, "unusable key in key set");
            AuthError::SignatureInvalid
        })?;

        let mut validation = Validation::new(header.alg);
        // exp/aud get their own, distinct checks after the signature passes
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<serde_json::Value>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, kid = ?header.kid, "claims token signature rejected");
            AuthError::SignatureInvalid
        })?;

        Ok(())
    }

    async fn find_key(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        let keys = self.keys_newer_than(KEY_SET_TTL).await?;
        if let Some(jwk) = select_key(&keys, kid) {
            return Ok(jwk.clone());
        }

        let keys = self.keys_newer_than(MIN_REFRESH_INTERVAL).await?;
        select_key(&keys, kid).cloned().ok_or_else(|| {
            warn!(kid = ?kid, "no matching key in key set");
            AuthError::SignatureInvalid
        })
    }

    async fn keys_newer_than(&self, max_age: Duration) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.fresh_keys(max_age).await {
            return Ok(keys);
        }

        // Waiters queue here and then reuse whatever the running fetch produced.
        let _flight = self.refresh.lock().await;

        if let Some(keys) = self.fresh_keys(max_age).await {
            return Ok(keys);
        }
        let recently_attempted = self
            .state
            .read()
            .await
            .last_attempt
            .is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL);
        if recently_attempted {
            return self.stale_keys().await;
        }

        // no data lock is held across the request
        let fetched = self.fetch().await;

        let mut state = self.state.write().await;
        let now = Instant::now();
        state.last_attempt = Some(now);
        match fetched {
            Ok(keys) => {
                let keys = Arc::new(keys);
                state.current = Some(CachedKeySet {
                    fetched_at: now,
                    keys: keys.clone(),
                });
                Ok(keys)
            }
            Err(()) => state
                .current
                .as_ref()
                .map(|stale| stale.keys.clone())
                .ok_or(AuthError::SignatureInvalid),
        }
    }

    async fn fresh_keys(&self, max_age: Duration) -> Option<Arc<JwkSet>> {
        let state = self.state.read().await;
        state
            .current
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < max_age)
            .map(|entry| entry.keys.clone())
    }

    async fn stale_keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        let state = self.state.read().await;
        match state.current.as_ref() {
            Some(entry) => Ok(entry.keys.clone()),
            None => {
                warn!(url = %self.url, "key set unavailable, refresh rate limited");
                Err(AuthError::SignatureInvalid)
            }
        }
    }

    async fn fetch(&self) -> Result<JwkSet, ()> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "key set fetch failed");
            })?;

        response.json::<JwkSet>().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "key set body is not a jwk set");
        })
    }
}

fn select_key<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => keys.find(kid),
        None if keys.keys.len() == 1 => keys.keys.first(),
        None => None,
    }
}
