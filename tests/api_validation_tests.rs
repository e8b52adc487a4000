// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request validation tests.
//!
//! Every request here is invalid, so it must be rejected with 400 before
//! the (offline) database is touched. A database access would surface as 500.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_token};

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", create_test_token("uid-1")),
        )
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn assert_invalid(request: Request<Body>, expected_details: Option<&str>) {
    let (app, _) = create_test_app();
    let uri = request.uri().to_string();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.status(),
        StatusCode::BAD_REQUEST,
        "{} should be rejected",
        uri
    );

    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_argument");
    if let Some(details) = expected_details {
        assert_eq!(body["details"], details);
    }
}

#[tokio::test]
async fn test_empty_rant_rejected() {
    assert_invalid(
        authed(Method::POST, "/api/rants", json!({ "content": "   " })),
        Some("Rant content cannot be empty"),
    )
    .await;
}

#[tokio::test]
async fn test_long_rant_rejected() {
    assert_invalid(
        authed(Method::POST, "/api/rants", json!({ "content": "x".repeat(501) })),
        None,
    )
    .await;
}

#[tokio::test]
async fn test_long_title_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/rants",
            json!({ "content": "ok", "title": "t".repeat(101) }),
        ),
        None,
    )
    .await;
}

#[tokio::test]
async fn test_unknown_visibility_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/rants",
            json!({ "content": "ok", "visibility": "secret" }),
        ),
        None,
    )
    .await;
}

#[tokio::test]
async fn test_bad_vote_type_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/rants/r1/vote",
            json!({ "voteType": "sideways" }),
        ),
        Some("Invalid vote type 'sideways'. Must be 'upvote' or 'downvote'"),
    )
    .await;
}

#[tokio::test]
async fn test_bad_stance_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/rants/r1/stance",
            json!({ "stance": "maybe" }),
        ),
        Some("Invalid stance 'maybe'. Must be 'favor' or 'against'"),
    )
    .await;
}

#[tokio::test]
async fn test_empty_comment_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/rants/r1/comments",
            json!({ "content": "" }),
        ),
        Some("Comment cannot be empty"),
    )
    .await;
}

#[tokio::test]
async fn test_invalid_profile_rejected() {
    assert_invalid(
        authed(
            Method::POST,
            "/api/profile",
            json!({ "name": "Ada", "username": "no spaces" }),
        ),
        Some("Username can only contain letters, numbers, and underscores"),
    )
    .await;

    assert_invalid(
        authed(
            Method::POST,
            "/api/profile",
            json!({ "name": "A", "username": "ada" }),
        ),
        Some("Name must be at least 2 characters"),
    )
    .await;
}

#[tokio::test]
async fn test_oversized_vote_lookup_rejected() {
    let rant_ids: Vec<String> = (0..101).map(|i| format!("r{}", i)).collect();
    assert_invalid(
        authed(
            Method::POST,
            "/api/votes/lookup",
            json!({ "rantIds": rant_ids }),
        ),
        None,
    )
    .await;
}

#[tokio::test]
async fn test_bad_feed_cursor_rejected() {
    assert_invalid(
        Request::builder()
            .uri("/api/feed?cursor=not-base64!")
            .body(Body::empty())
            .unwrap(),
        Some("Invalid 'cursor' parameter"),
    )
    .await;
}

#[tokio::test]
async fn test_bad_comment_after_rejected() {
    assert_invalid(
        Request::builder()
            .uri("/api/rants/r1/comments?after=yesterday")
            .body(Body::empty())
            .unwrap(),
        None,
    )
    .await;
}

#[tokio::test]
async fn test_empty_hashtag_rejected() {
    assert_invalid(
        Request::builder()
            .uri("/api/hashtags/%23/rants")
            .body(Body::empty())
            .unwrap(),
        Some("Hashtag cannot be empty"),
    )
    .await;
}

#[tokio::test]
async fn test_database_errors_hide_details() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/api/feed").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_username_check_degrades_to_taken() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/usernames/someone/available")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["available"], false);
}
