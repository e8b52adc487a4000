// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rantboard API Server
//!
//! Serves the rant feed, comments, votes, bookmarks and stances over
//! Firestore for the web client.

use rantboard::{
    config::Config, db::FirestoreDb, services::FirebaseTokenVerifier, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Rantboard API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firebase_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let token_verifier = Arc::new(
        FirebaseTokenVerifier::new(&config).expect("Failed to initialize token verifier"),
    );

    tracing::info!(
        poll_interval_ms = config.comment_poll_interval.as_millis() as u64,
        "Comment feeds poll interval"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, token_verifier));

    // Build router
    let app = rantboard::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rantboard=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
