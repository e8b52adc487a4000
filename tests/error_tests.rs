// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use rantboard::error::AppError;

#[test]
fn test_status_and_codes() {
    let cases = [
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "invalid_token"),
        (
            AppError::Unauthorized("x".into()),
            StatusCode::FORBIDDEN,
            "unauthorized",
        ),
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
        (
            AppError::InvalidArgument("x".into()),
            StatusCode::BAD_REQUEST,
            "invalid_argument",
        ),
        (AppError::AlreadySet("x".into()), StatusCode::CONFLICT, "already_set"),
        (AppError::Conflict("x".into()), StatusCode::CONFLICT, "conflict"),
        (
            AppError::AuthProvider("x".into()),
            StatusCode::BAD_GATEWAY,
            "auth_provider_error",
        ),
        (
            AppError::Database("x".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "database_error",
        ),
    ];

    for (err, status, code) in cases {
        assert_eq!(err.status_and_code(), (status, code), "{:?}", err);
    }
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let response = AppError::AlreadySet("User has already set a stance for this rant".into())
        .into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "already_set");
    assert_eq!(body["details"], "User has already set a stance for this rant");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let response = AppError::Internal(anyhow::anyhow!("secret stack detail")).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}
