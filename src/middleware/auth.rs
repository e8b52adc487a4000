// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ID token authentication middleware.

use crate::error::AppError;
use crate::services::firebase_auth::TokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

pub use crate::services::firebase_auth::AuthUser;

/// Cookie carrying the ID token for browser sessions.
pub const SESSION_COOKIE: &str = "__session";

const SESSION_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Middleware that requires a valid ID token.
///
/// On success the caller's [`AuthUser`] is available to handlers as an
/// `Extension`.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Cookie first, then header
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::InvalidToken)?
            .to_string(),
    };

    let user = state
        .token_verifier
        .verify(&token)
        .await
        .map_err(|e| match e {
            TokenError::Invalid(reason) => {
                tracing::debug!(reason = %reason, "Rejected ID token");
                AppError::InvalidToken
            }
            TokenError::KeysUnavailable(reason) => AppError::AuthProvider(reason),
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Mint an HS256 ID token accepted by a verifier configured with the same
/// shared secret and project. For local development and tests.
pub fn create_session_token(
    uid: &str,
    email: Option<&str>,
    project_id: &str,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use crate::services::firebase_auth::IdTokenClaims;
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = IdTokenClaims {
        iss: format!("https://securetoken.google.com/{}", project_id),
        aud: project_id.to_string(),
        sub: uid.to_string(),
        iat: now,
        exp: now + SESSION_TOKEN_TTL.as_secs() as usize,
        email: email.map(str::to_string),
        name: None,
        picture: None,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
