// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes.
//!
//! Sign-in itself happens in the browser against Firebase Auth; these
//! endpoints report who the API thinks the caller is and clear the cookie.

use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::services::firebase_auth::provider_error_message;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/error-message", get(error_message))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Whether profile setup is done; the client redirects to setup if not.
    pub profile_completed: bool,
}

/// Current identity plus profile-setup state.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionResponse> {
    let profile_completed = state.users.check_profile_exists(&user.uid).await;

    Json(SessionResponse {
        uid: user.uid,
        email: user.email,
        display_name: user.display_name,
        photo_url: user.photo_url,
        profile_completed,
    })
}

/// Clear the session cookie. The client also signs out of Firebase.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

#[derive(Deserialize)]
struct ErrorMessageQuery {
    #[serde(default)]
    code: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ErrorMessageResponse {
    pub message: String,
}

/// User-facing text for an auth provider error code.
async fn error_message(Query(params): Query<ErrorMessageQuery>) -> Json<ErrorMessageResponse> {
    Json(ErrorMessageResponse {
        message: provider_error_message(&params.code).to_string(),
    })
}
