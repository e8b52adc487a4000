// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid ID tokens
//! 2. Protected routes accept a bearer token or the session cookie
//! 3. CORS preflight requests return correct headers

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rantboard::config::Config;
use rantboard::services::firebase_auth::IdTokenClaims;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_token};

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = create_test_app();

    let response = app.oneshot(get("/api/session")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_with_bearer("/api/session", "not.a.jwt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_other_project_rejected() {
    let (app, _) = create_test_app();
    let config = Config::test_default();
    let key = config.auth_dev_signing_key.unwrap();

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = IdTokenClaims {
        iss: "https://securetoken.google.com/other-project".to_string(),
        aud: "other-project".to_string(),
        sub: "uid-1".to_string(),
        exp: now + 600,
        iat: now,
        email: None,
        name: None,
        picture: None,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&key),
    )
    .unwrap();

    let response = app
        .oneshot(get_with_bearer("/api/session", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_with_bearer_token() {
    let (app, _) = create_test_app();
    let token = create_test_token("uid-42");

    let response = app
        .oneshot(get_with_bearer("/api/session", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["uid"], "uid-42");
    assert_eq!(body["email"], "test@example.com");
    // Offline database: profile lookup fails, reported as not completed
    assert_eq!(body["profileCompleted"], false);
}

#[tokio::test]
async fn test_session_with_cookie() {
    let (app, _) = create_test_app();
    let token = create_test_token("uid-cookie");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/session")
                .header(header::COOKIE, format!("__session={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["uid"], "uid-cookie");
}

#[tokio::test]
async fn test_vote_lookup_degrades_to_no_vote() {
    let (app, _) = create_test_app();
    let token = create_test_token("uid-1");

    let response = app
        .oneshot(get_with_bearer("/api/rants/r1/vote", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["voteType"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_write_routes_require_auth() {
    let (app, _) = create_test_app();

    for (method, uri) in [
        ("POST", "/api/rants"),
        ("PATCH", "/api/rants/r1"),
        ("DELETE", "/api/rants/r1"),
        ("POST", "/api/rants/r1/vote"),
        ("POST", "/api/rants/r1/stance"),
        ("POST", "/api/rants/r1/comments"),
        ("DELETE", "/api/comments/c1"),
        ("GET", "/api/bookmarks"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should require auth",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_patch() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/rants/r1")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("PATCH"));
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_health_has_security_headers() {
    let (app, _) = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, "__session=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("__session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_auth_error_message_lookup() {
    let (app, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(get("/auth/error-message?code=auth/too-many-requests"))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await["message"],
        "Too many failed attempts. Please try again later."
    );

    let response = app
        .oneshot(get("/auth/error-message?code=auth/mystery"))
        .await
        .unwrap();
    assert_eq!(
        json_body(response).await["message"],
        "Failed to sign in. Please try again."
    );
}
