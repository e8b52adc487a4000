// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rant routes: feed, trending, hashtags, replies and author edits.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::rant::{RantOptions, RantUpdate};
use crate::models::Rant;
use crate::routes::page_limit;
use crate::services::RantPage;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 50;
const CURSOR_PARTS: usize = 2;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/feed", get(get_feed))
        .route("/api/rants/trending", get(get_trending))
        .route("/api/rants/{id}", get(get_rant))
        .route("/api/rants/{id}/replies", get(get_replies))
        .route("/api/rants/{id}/view", post(record_view))
        .route("/api/hashtags/{tag}/rants", get(get_hashtag_rants))
}

/// Rant routes that act as the signed-in user.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rants", post(create_rant))
        .route(
            "/api/rants/{id}",
            axum::routing::patch(update_rant).delete(delete_rant),
        )
        .route("/api/rants/{id}/share", post(record_share))
        .route("/api/rants/{id}/reconcile", post(reconcile_counters))
}

// ─── Responses ───────────────────────────────────────────────

/// A rant with its document ID.
#[derive(Debug, Serialize)]
pub struct RantResponse {
    pub id: String,
    #[serde(flatten)]
    pub rant: Rant,
}

impl From<Rant> for RantResponse {
    fn from(rant: Rant) -> Self {
        Self {
            id: rant.id.clone(),
            rant,
        }
    }
}

pub(crate) fn rant_responses(rants: Vec<Rant>) -> Vec<RantResponse> {
    rants.into_iter().map(RantResponse::from).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RantListResponse {
    pub rants: Vec<RantResponse>,
}

/// One page of a newest-first listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RantPageResponse {
    pub rants: Vec<RantResponse>,
    /// Opaque token for the next page
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl From<RantPage> for RantPageResponse {
    fn from(page: RantPage) -> Self {
        Self {
            rants: rant_responses(page.rants),
            next_cursor: page.next_cursor.filter(|_| page.has_more).map(encode_cursor),
            has_more: page.has_more,
        }
    }
}

// ─── Cursors ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub(crate) struct PageQuery {
    pub limit: Option<u32>,
    /// Cursor from a previous page (opaque token).
    pub cursor: Option<String>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

pub(crate) fn parse_cursor(cursor: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::InvalidArgument("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)
        })
        .transpose()
}

pub(crate) fn encode_cursor(created_at: DateTime<Utc>) -> String {
    let payload = format!(
        "{}:{}",
        created_at.timestamp(),
        created_at.timestamp_subsec_nanos()
    );
    URL_SAFE_NO_PAD.encode(payload)
}

pub(crate) fn page_size(requested: Option<u32>) -> u32 {
    page_limit(requested, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
}

// ─── Public reads ────────────────────────────────────────────

/// Newest public rants. Pages may be short after filtering; keep going
/// while `hasMore` is set.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<RantPageResponse>> {
    let limit = page_size(params.limit);
    let before = parse_cursor(params.cursor.as_deref())?;

    tracing::debug!(limit, before = ?before, "Fetching feed");

    let page = state.rants.get_feed(limit, before).await?;
    Ok(Json(page.into()))
}

async fn get_trending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<RantListResponse>> {
    let rants = state.rants.get_trending_rants(page_size(params.limit)).await?;
    Ok(Json(RantListResponse {
        rants: rant_responses(rants),
    }))
}

/// Any rant by ID, including soft-deleted ones (the client shows a
/// tombstone).
async fn get_rant(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
) -> Result<Json<RantResponse>> {
    let rant = state
        .rants
        .get_rant(&rant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rant {} not found", rant_id)))?;
    Ok(Json(rant.into()))
}

async fn get_replies(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<RantListResponse>> {
    let rants = state
        .rants
        .get_replies(&rant_id, page_size(params.limit))
        .await?;
    Ok(Json(RantListResponse {
        rants: rant_responses(rants),
    }))
}

async fn get_hashtag_rants(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<RantListResponse>> {
    let rants = state
        .rants
        .search_by_hashtag(&tag, page_size(params.limit))
        .await?;
    Ok(Json(RantListResponse {
        rants: rant_responses(rants),
    }))
}

async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
) -> Result<StatusCode> {
    state.rants.record_view(&rant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Authenticated writes ────────────────────────────────────

#[derive(Deserialize)]
struct CreateRantRequest {
    content: String,
    #[serde(flatten)]
    options: RantOptions,
}

async fn create_rant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateRantRequest>,
) -> Result<(StatusCode, Json<RantResponse>)> {
    let rant = state
        .rants
        .create_rant(&user.uid, &body.content, body.options)
        .await?;
    Ok((StatusCode::CREATED, Json(rant.into())))
}

async fn update_rant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
    Json(update): Json<RantUpdate>,
) -> Result<Json<RantResponse>> {
    let rant = state.rants.update_rant(&rant_id, update, &user.uid).await?;
    Ok(Json(rant.into()))
}

async fn delete_rant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Result<StatusCode> {
    state.rants.delete_rant(&rant_id, &user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_share(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Result<StatusCode> {
    tracing::debug!(rant_id = %rant_id, user_id = %user.uid, "Rant shared");
    state.rants.record_share(&rant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Author-only counter repair.
async fn reconcile_counters(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
) -> Result<Json<RantResponse>> {
    let rant = state
        .rants
        .reconcile_rant_counters(&rant_id, &user.uid)
        .await?;
    Ok(Json(rant.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip_keeps_nanos() {
        let at = DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        assert_eq!(parse_cursor(Some(&encode_cursor(at))).unwrap(), Some(at));
        assert_eq!(parse_cursor(None).unwrap(), None);
    }

    #[test]
    fn test_invalid_cursors_rejected() {
        for raw in [
            "not base64!",
            &URL_SAFE_NO_PAD.encode("123"),
            &URL_SAFE_NO_PAD.encode("a:b"),
            &URL_SAFE_NO_PAD.encode("1:2:3"),
        ] {
            assert!(
                matches!(parse_cursor(Some(raw)), Err(AppError::InvalidArgument(_))),
                "cursor {raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_page_response_hides_cursor_when_exhausted() {
        let at = Utc::now();
        let last = RantPageResponse::from(RantPage {
            rants: vec![],
            next_cursor: Some(at),
            has_more: false,
        });
        assert!(last.next_cursor.is_none());

        let more = RantPageResponse::from(RantPage {
            rants: vec![],
            next_cursor: Some(at),
            has_more: true,
        });
        assert_eq!(more.next_cursor, Some(encode_cursor(at)));
    }

    #[test]
    fn test_rant_response_includes_id() {
        let rant = crate::models::rant::tests::make_rant("r42", Utc::now());
        let json = serde_json::to_value(RantResponse::from(rant)).unwrap();
        assert_eq!(json["id"], "r42");
        assert_eq!(json["authorName"], "Anonymous");
        assert_eq!(json["commentsCount"], 0);
    }
}
