// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment routes, including the live comment stream (Server-Sent Events).

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::comment::CommentOptions;
use crate::models::Comment;
use crate::routes::page_limit;
use crate::services::comment_feed::{CommentFeed, CommentSnapshot};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::{stream, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;

const DEFAULT_COMMENT_PAGE: u32 = 50;
const MAX_COMMENT_PAGE: u32 = 100;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rants/{id}/comments", get(list_comments))
        .route("/api/rants/{id}/comments/count", get(count_comments))
        .route("/api/rants/{id}/comments/stream", get(stream_comments))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rants/{id}/comments", axum::routing::post(create_comment))
        .route(
            "/api/comments/{id}",
            patch(update_comment).delete(delete_comment),
        )
}

/// A comment with its document ID.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    #[serde(flatten)]
    pub comment: Comment,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.clone(),
            comment,
        }
    }
}

#[derive(Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
}

impl From<Vec<Comment>> for CommentListResponse {
    fn from(comments: Vec<Comment>) -> Self {
        Self {
            comments: comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

#[derive(Deserialize)]
struct CommentsQuery {
    limit: Option<u32>,
    /// Only comments created after this time (RFC3339)
    after: Option<String>,
}

fn parse_after_timestamp(after: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    after
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| {
                    AppError::InvalidArgument(
                        "Invalid 'after' parameter: must be RFC3339 datetime".to_string(),
                    )
                })
        })
        .transpose()
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
    Query(params): Query<CommentsQuery>,
) -> Result<Json<CommentListResponse>> {
    let limit = page_limit(params.limit, DEFAULT_COMMENT_PAGE, MAX_COMMENT_PAGE);
    let after = parse_after_timestamp(params.after.as_deref())?;

    let comments = state
        .comments
        .get_comments_by_rant(&rant_id, limit, after)
        .await?;
    Ok(Json(comments.into()))
}

#[derive(Serialize)]
pub struct CommentCountResponse {
    pub count: usize,
}

async fn count_comments(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
) -> Result<Json<CommentCountResponse>> {
    let count = state.comments.get_comment_count(&rant_id).await?;
    Ok(Json(CommentCountResponse { count }))
}

/// Live comment snapshots for a rant.
///
/// Each `comments` event carries the full visible window, oldest first.
/// Viewers of the same rant share one poller, which stops when the last
/// stream closes.
async fn stream_comments(
    State(state): State<Arc<AppState>>,
    Path(rant_id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    state.rants.require_live_rant(&rant_id).await?;

    let feed = state.comment_feeds.watch(&rant_id);
    tracing::debug!(rant_id = %rant_id, "Comment stream opened");

    let watcher = FeedWatcher {
        snapshots: feed.receiver(),
        _feed: feed,
        primed: false,
    };

    Ok(Sse::new(stream::unfold(watcher, next_comment_event)).keep_alive(KeepAlive::default()))
}

/// Keeps the shared feed alive for as long as the stream is open.
struct FeedWatcher {
    snapshots: watch::Receiver<CommentSnapshot>,
    _feed: Arc<CommentFeed>,
    primed: bool,
}

async fn next_comment_event(
    mut watcher: FeedWatcher,
) -> Option<(std::result::Result<Event, Infallible>, FeedWatcher)> {
    loop {
        // The current snapshot goes out first, then one event per change.
        if watcher.primed {
            watcher.snapshots.changed().await.ok()?;
        }
        watcher.primed = true;

        let snapshot = watcher.snapshots.borrow_and_update().clone();
        let Some(comments) = snapshot else {
            continue;
        };

        match comments_event(&comments) {
            Ok(event) => return Some((Ok(event), watcher)),
            Err(e) => tracing::warn!(error = %e, "Failed to encode comment snapshot"),
        }
    }
}

fn comments_event(comments: &[Comment]) -> std::result::Result<Event, axum::Error> {
    let body = CommentListResponse::from(comments.to_vec());
    Event::default().event("comments").json_data(body)
}

#[derive(Deserialize)]
struct CreateCommentRequest {
    content: String,
    #[serde(flatten)]
    options: CommentOptions,
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(rant_id): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let comment = state
        .comments
        .create_comment(&user.uid, &rant_id, &body.content, body.options)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[derive(Deserialize)]
struct UpdateCommentRequest {
    content: String,
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>> {
    let comment = state
        .comments
        .update_comment(&comment_id, &body.content, &user.uid)
        .await?;
    Ok(Json(comment.into()))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> Result<StatusCode> {
    state.comments.delete_comment(&comment_id, &user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}
