// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile setup and public user pages.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::user::{ProfileInput, ProfileUpdate, UserStatsSummary};
use crate::models::{UserProfile, UsernameRecord};
use crate::routes::comments::CommentListResponse;
use crate::routes::page_limit;
use crate::routes::rants::{page_size, parse_cursor, PageQuery, RantPageResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_SEARCH_RESULTS: u32 = 10;
const MAX_SEARCH_RESULTS: u32 = 50;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/search", get(search_users))
        .route("/api/users/{username}", get(get_user))
        .route("/api/users/{username}/rants", get(get_user_rants))
        .route("/api/users/{username}/comments", get(get_user_comments))
        .route("/api/users/{username}/stats", get(get_user_stats))
        .route(
            "/api/usernames/{username}/available",
            get(check_username_available),
        )
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/profile",
        get(get_own_profile)
            .post(create_profile)
            .patch(update_profile),
    )
}

// ─── Responses ───────────────────────────────────────────────

/// Profile as shown to anyone. Email stays private.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub uid: String,
    pub name: String,
    pub username: String,
    pub display_username: String,
    pub bio: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub rants_count: i64,
    pub comments_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl From<UserProfile> for PublicProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            display_username: profile.shown_username().to_string(),
            uid: profile.uid,
            name: profile.name,
            username: profile.username,
            bio: profile.bio,
            photo_url: profile.photo_url,
            rants_count: profile.rants_count,
            comments_count: profile.comments_count,
            followers_count: profile.followers_count,
            following_count: profile.following_count,
        }
    }
}

/// The signed-in user's own profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnProfile {
    #[serde(flatten)]
    pub profile: PublicProfile,
    pub email: Option<String>,
    pub profile_completed: bool,
}

impl From<UserProfile> for OwnProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email.clone(),
            profile_completed: profile.is_completed(),
            profile: profile.into(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsernameAvailability {
    pub available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub uid: String,
    pub username: String,
    pub display_username: String,
}

impl From<UsernameRecord> for UserSearchResult {
    fn from(record: UsernameRecord) -> Self {
        Self {
            display_username: record
                .display_username
                .unwrap_or_else(|| record.username.clone()),
            uid: record.uid,
            username: record.username,
        }
    }
}

#[derive(Serialize)]
pub struct UserSearchResponse {
    pub users: Vec<UserSearchResult>,
}

// ─── Own profile ─────────────────────────────────────────────

async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<OwnProfile>> {
    let profile = state
        .users
        .get_user_profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
    Ok(Json(profile.into()))
}

/// Profile setup after first sign-in. The email comes from the ID token.
async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<OwnProfile>)> {
    let profile = state
        .users
        .create_user_profile(&user.uid, user.email.clone(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<OwnProfile>> {
    let profile = state.users.update_user_profile(&user.uid, update).await?;
    Ok(Json(profile.into()))
}

// ─── Public user pages ───────────────────────────────────────

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    max: Option<u32>,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<UserSearchResponse>> {
    let max = page_limit(params.max, DEFAULT_SEARCH_RESULTS, MAX_SEARCH_RESULTS);
    let records = state.users.search_users(&params.q, max).await?;
    Ok(Json(UserSearchResponse {
        users: records.into_iter().map(UserSearchResult::from).collect(),
    }))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>> {
    let profile = state.users.require_user_by_username(&username).await?;
    Ok(Json(profile.into()))
}

async fn get_user_rants(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<RantPageResponse>> {
    let limit = page_size(params.limit);
    let before = parse_cursor(params.cursor.as_deref())?;
    let profile = state.users.require_user_by_username(&username).await?;

    let page = state
        .rants
        .get_user_rants(&profile.uid, limit, before)
        .await?;
    Ok(Json(page.into()))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

async fn get_user_comments(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<CommentListResponse>> {
    let profile = state.users.require_user_by_username(&username).await?;
    let comments = state
        .comments
        .get_user_comments(&profile.uid, page_size(params.limit))
        .await?;
    Ok(Json(comments.into()))
}

async fn get_user_stats(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserStatsSummary>> {
    let profile = state.users.require_user_by_username(&username).await?;
    let stats = state.users.get_user_stats(&profile.uid).await?;
    Ok(Json(stats))
}

/// Read errors report the name as taken.
async fn check_username_available(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Json<UsernameAvailability> {
    let available = state.users.is_username_available(&username).await;
    Json(UsernameAvailability { available })
}
