// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use rantboard::config::Config;
use rantboard::db::FirestoreDb;
use rantboard::middleware::auth::create_session_token;
use rantboard::routes::create_router;
use rantboard::services::FirebaseTokenVerifier;
use rantboard::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build state over `db` with the test config (shared-secret tokens).
#[allow(dead_code)]
pub fn test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::test_default();
    let verifier =
        Arc::new(FirebaseTokenVerifier::new(&config).expect("Failed to build token verifier"));
    Arc::new(AppState::new(config, db, verifier))
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db_offline());
    (create_router(state.clone()), state)
}

/// ID token the test app accepts for `uid`.
#[allow(dead_code)]
pub fn create_test_token(uid: &str) -> String {
    let config = Config::test_default();
    let key = config
        .auth_dev_signing_key
        .expect("test config has a signing key");
    create_session_token(uid, Some("test@example.com"), &config.firebase_project_id, &key)
        .expect("Failed to sign test token")
}

/// Unique suffix for test isolation in a shared emulator.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
