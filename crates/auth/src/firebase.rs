//! Firebase ID token verification.
//!
//! Firebase signs ID tokens with RS256 using rotating keys published as a JWK
//! set. A token is valid when:
//! - its header names a published `kid`,
//! - the signature verifies against that key,
//! - `aud` is the project id and `iss` is `https://securetoken.google.com/<project id>`,
//! - the time claims pass [`validate_claims`].
//!
//! The key set is cached for the `max-age` the endpoint advertises. Verification
//! outcomes are never cached.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::claims::{CLOCK_SKEW_SECS, IdTokenClaims, validate_claims};
use crate::verifier::{TokenError, TokenVerifier};

pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum age of the cached key set before an unknown `kid` forces a refetch.
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    #[serde(default)]
    kty: String,
    n: String,
    e: String,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

fn unknown_key(kid: &str) -> TokenError {
    TokenError::UnknownKey(Some(kid.to_string()))
}

pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    min_refresh_interval: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            http: reqwest::Client::new(),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: RwLock::new(None),
        }
    }

    /// Fetch signing keys from a different endpoint (emulators, tests).
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    /// How old the key set must be before an unknown `kid` triggers a refetch.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.leeway = CLOCK_SKEW_SECS.unsigned_abs();
        validation
    }

    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, TokenError> {
        let seen = {
            let cache = self.cache.read().await;
            match cache.as_ref() {
                Some(cached) if cached.is_fresh() => {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    Some(cached.fetched_at)
                }
                Some(cached) => Some(cached.fetched_at),
                None => None,
            }
        };

        // Refreshers are serialized on the write lock; whoever waited re-checks
        // the set the previous holder stored before fetching again.
        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
            let refreshed_meanwhile = seen != Some(cached.fetched_at);
            let recently_fetched = cached.fetched_at.elapsed() < self.min_refresh_interval;
            if refreshed_meanwhile || recently_fetched {
                return cached.keys.get(kid).cloned().ok_or_else(|| unknown_key(kid));
            }
            debug!(kid, "unknown kid, refreshing firebase signing keys");
        }

        let fresh = self.fetch_keys().await?;
        let key = fresh.keys.get(kid).cloned();
        *cache = Some(fresh);

        key.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, TokenError> {
        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TokenError::KeyFetch(e.to_string()))?;

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_KEY_TTL);

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| TokenError::KeyFetch(e.to_string()))?;

        let keys = decoding_keys(set);
        debug!(count = keys.len(), ttl_secs = ttl.as_secs(), "refreshed firebase signing keys");

        let fetched_at = Instant::now();
        Ok(CachedKeys {
            keys,
            fetched_at,
            expires_at: fetched_at + ttl,
        })
    }
}

fn decoding_keys(set: JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::with_capacity(set.keys.len());
    for jwk in set.keys {
        if !jwk.kty.is_empty() && jwk.kty != "RSA" {
            continue;
        }
        match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => {
                keys.insert(jwk.kid, key);
            }
            Err(e) => warn!(kid = %jwk.kid, error = %e, "skipping unusable signing key"),
        }
    }
    keys
}

/// Extract `max-age` from a `Cache-Control` header value.
pub fn parse_max_age(header: &str) -> Option<Duration> {
    header.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if name.eq_ignore_ascii_case("max-age") {
            value.trim().parse::<u64>().ok().map(Duration::from_secs)
        } else {
            None
        }
    })
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<(), TokenError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenError::Rejected(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header.kid.ok_or(TokenError::UnknownKey(None))?;

        let key = self.signing_key(&kid).await?;
        let claims = decode::<IdTokenClaims>(token, &key, &self.validation())?.claims;
        validate_claims(&claims, Utc::now())
    }
}
