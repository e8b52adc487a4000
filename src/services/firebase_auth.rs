// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! Sign-in (email/password, Google) happens in the browser against Firebase
//! Auth. The API only verifies the resulting ID token and turns it into an
//! [`AuthUser`].

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity of the signed-in caller, injected into protected handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Token verification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is malformed, expired or issued for another project.
    Invalid(String),
    /// Signing keys could not be fetched.
    KeysUnavailable(String),
}

/// ID token claims we read.
///
/// Firebase puts the display name and photo in `name` / `picture`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl From<IdTokenClaims> for AuthUser {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            display_name: claims.name,
            photo_url: claims.picture,
        }
    }
}

enum VerifierMode {
    /// RS256 against Google's published Firebase signing keys.
    Firebase,
    /// HS256 with a shared secret (emulator and tests).
    SharedSecret(Arc<DecodingKey>),
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase Auth ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    mode: VerifierMode,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    /// Build the verifier the config asks for.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        let mode = match &config.auth_dev_signing_key {
            Some(key) => {
                tracing::warn!("Using shared-secret session tokens; not for production");
                VerifierMode::SharedSecret(Arc::new(DecodingKey::from_secret(key)))
            }
            None => VerifierMode::Firebase,
        };

        tracing::info!(project = %config.firebase_project_id, "Initialized Firebase token verifier");

        Ok(Self {
            http_client,
            project_id: config.firebase_project_id.clone(),
            mode,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify an ID token and return the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let header = decode_header(token)
            .map_err(|e| TokenError::Invalid(format!("invalid JWT header: {e}")))?;

        let (algorithm, decoding_key) = match &self.mode {
            VerifierMode::SharedSecret(key) => (Algorithm::HS256, key.clone()),
            VerifierMode::Firebase => {
                let kid = header
                    .kid
                    .as_deref()
                    .ok_or_else(|| TokenError::Invalid("missing JWT kid".to_string()))?;
                (Algorithm::RS256, self.decoding_key_for_kid(kid).await?)
            }
        };

        if header.alg != algorithm {
            return Err(TokenError::Invalid(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.expected_issuer()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| TokenError::Invalid(format!("JWT validation failed: {e}")))?
            .claims;

        validate_iat(claims.iat, now_unix_secs())?;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Invalid("empty subject".to_string()));
        }

        Ok(claims.into())
    }

    fn expected_issuer(&self) -> String {
        format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)
    }

    /// Claims for a token this verifier would accept, for `uid`.
    pub fn claims_for(&self, uid: &str, email: Option<&str>, ttl: Duration) -> IdTokenClaims {
        let now = now_unix_secs() as usize;
        IdTokenClaims {
            iss: self.expected_issuer(),
            aud: self.project_id.clone(),
            sub: uid.to_string(),
            exp: now + ttl.as_secs() as usize,
            iat: now,
            email: email.map(str::to_string),
            name: None,
            picture: None,
        }
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, TokenError> {
        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(TokenError::Invalid(format!(
            "JWT kid not found in Firebase keys: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), TokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!("Refreshing Firebase signing keys");

        let response = self
            .http_client
            .get(FIREBASE_JWKS_URL)
            .send()
            .await
            .map_err(|e| TokenError::KeysUnavailable(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TokenError::KeysUnavailable(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_cache_control_max_age)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| TokenError::KeysUnavailable(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid = HashMap::new();
        for jwk in jwks.keys.into_iter().filter(Jwk::is_rs256_signing_key) {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(TokenError::KeysUnavailable(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase signing keys refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && self.alg.as_deref().map_or(true, |alg| alg == "RS256")
            && self.use_.as_deref().map_or(true, |use_| use_ == "sig")
    }
}

fn validate_iat(iat: usize, now: u64) -> Result<(), TokenError> {
    if iat as u64 > now + CLOCK_SKEW_SECS {
        return Err(TokenError::Invalid("iat claim is in the future".to_string()));
    }
    Ok(())
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// User-facing message for a Firebase Auth error code.
pub fn provider_error_message(code: &str) -> &'static str {
    match code {
        "auth/user-not-found" => "No account found with this email address.",
        "auth/wrong-password" => "Incorrect password.",
        "auth/invalid-email" => "Invalid email address.",
        "auth/too-many-requests" => "Too many failed attempts. Please try again later.",
        "auth/popup-closed-by-user" => "Sign in was cancelled.",
        _ => "Failed to sign in. Please try again.",
    }
}
