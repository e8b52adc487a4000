// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The hosted database and auth provider are addressed by the Firebase
//! project ID; everything else has a local-development default.

use std::env;
use std::time::Duration;

const DEFAULT_COMMENT_POLL_INTERVAL_MS: u64 = 2000;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID (Firestore database and ID token audience)
    pub firebase_project_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// How often live comment subscriptions re-read their window
    pub comment_poll_interval: Duration,
    /// HS256 key for locally minted session tokens.
    ///
    /// When set, Firebase JWKS verification is replaced by this key. Only
    /// meant for the emulator and tests.
    pub auth_dev_signing_key: Option<Vec<u8>>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            comment_poll_interval: Duration::from_millis(DEFAULT_COMMENT_POLL_INTERVAL_MS),
            auth_dev_signing_key: Some(b"test_session_key_32_bytes_long!!".to_vec()),
        }
    }
}

impl Config {
    /// Config used by unit and integration tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        let comment_poll_interval = match env::var("COMMENT_POLL_INTERVAL_MS") {
            Ok(raw) => {
                let millis: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("COMMENT_POLL_INTERVAL_MS"))?;
                if millis == 0 {
                    return Err(ConfigError::Invalid("COMMENT_POLL_INTERVAL_MS"));
                }
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_millis(DEFAULT_COMMENT_POLL_INTERVAL_MS),
        };

        Ok(Self {
            firebase_project_id,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            comment_poll_interval,
            auth_dev_signing_key: env::var("AUTH_DEV_SIGNING_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(String::into_bytes),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
