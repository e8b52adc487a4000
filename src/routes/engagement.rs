// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Votes, bookmarks and stances on rants.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Stance, StanceStats, StanceValue, VoteType};
use crate::routes::page_limit;
use crate::routes::rants::{rant_responses, RantListResponse};
use crate::services::VoteOutcome;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Upper bound on rant IDs in one vote lookup.
const MAX_VOTE_LOOKUP: usize = 100;
const DEFAULT_BOOKMARK_PAGE: u32 = 50;
const MAX_BOOKMARK_PAGE: u32 = 100;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/rants/{id}/stances/stats", get(get_stance_stats))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rants/{id}/vote", get(get_vote).post(cast_vote))
        .route("/api/votes/lookup", post(lookup_votes))
        .route(
            "/api/rants/{id}/bookmark",
            get(get_bookmark).post(toggle_bookmark),
        )
        .route("/api/bookmarks", get(list_bookmarks))
        .route("/api/rants/{id}/stance", get(get_stance).post(set_stance))
}

// ─── Votes ───────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVoteResponse {
    pub vote_type: Option<VoteType>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    vote_type: String,
}

async fn get_vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Json<UserVoteResponse> {
    let vote_type = state.votes.get_user_vote(&user.uid, &rant_id).await;
    Json(UserVoteResponse { vote_type })
}

/// Same type again removes the vote; the other type switches it.
async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteOutcome>> {
    let outcome = state
        .votes
        .vote_on_rant(&user.uid, &rant_id, &body.vote_type)
        .await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteLookupRequest {
    rant_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct VoteLookupResponse {
    /// rantId -> vote type, only for rants the user voted on
    pub votes: HashMap<String, VoteType>,
}

async fn lookup_votes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<VoteLookupRequest>,
) -> Result<Json<VoteLookupResponse>> {
    if body.rant_ids.len() > MAX_VOTE_LOOKUP {
        return Err(AppError::InvalidArgument(format!(
            "At most {} rant IDs per lookup",
            MAX_VOTE_LOOKUP
        )));
    }

    let votes = state.votes.get_user_votes(&user.uid, &body.rant_ids).await;
    Ok(Json(VoteLookupResponse { votes }))
}

// ─── Bookmarks ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BookmarkResponse {
    pub bookmarked: bool,
}

async fn get_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Json<BookmarkResponse> {
    let bookmarked = state.bookmarks.is_bookmarked(&user.uid, &rant_id).await;
    Json(BookmarkResponse { bookmarked })
}

async fn toggle_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Result<Json<BookmarkResponse>> {
    let bookmarked = state
        .bookmarks
        .toggle_bookmark(&user.uid, &rant_id)
        .await?;
    Ok(Json(BookmarkResponse { bookmarked }))
}

#[derive(Deserialize)]
struct BookmarksQuery {
    limit: Option<u32>,
}

/// Saved rants, most recently saved first.
async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<BookmarksQuery>,
) -> Result<Json<RantListResponse>> {
    let limit = page_limit(params.limit, DEFAULT_BOOKMARK_PAGE, MAX_BOOKMARK_PAGE);
    let rants = state
        .bookmarks
        .get_bookmarked_rants(&user.uid, limit as usize)
        .await?;
    Ok(Json(RantListResponse {
        rants: rant_responses(rants),
    }))
}

// ─── Stances ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserStanceResponse {
    pub stance: Option<StanceValue>,
}

#[derive(Deserialize)]
struct StanceRequest {
    stance: String,
}

async fn get_stance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Result<Json<UserStanceResponse>> {
    let stance = state.stances.get_user_stance(&user.uid, &rant_id).await?;
    Ok(Json(UserStanceResponse {
        stance: stance.map(|s| s.stance),
    }))
}

/// Stances are write-once; a second submit is a 409.
async fn set_stance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
    Json(body): Json<StanceRequest>,
) -> Result<(StatusCode, Json<Stance>)> {
    let stance = state
        .stances
        .set_user_stance(&user.uid, &rant_id, &body.stance)
        .await?;
    Ok((StatusCode::CREATED, Json(stance)))
}

async fn get_stance_stats(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
) -> Result<Json<StanceStats>> {
    let stats = state.stances.get_rant_stance_stats(&rant_id).await?;
    Ok(Json(stats))
}
