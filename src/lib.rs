// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rantboard: short public rants with votes, comments and stances.
//!
//! This crate provides the backend API over Firestore. Clients authenticate
//! with Firebase Auth and send the resulting ID token.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod text;

use config::Config;
use db::FirestoreDb;
use services::{
    BookmarkService, CommentFeedHub, CommentService, FirebaseTokenVerifier, RantService,
    StanceService, UserService, VoteService,
};
use std::sync::Arc;

/// Comments per live feed window.
pub const COMMENT_FEED_WINDOW: u32 = 50;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub users: UserService,
    pub rants: RantService,
    pub comments: CommentService,
    pub comment_feeds: CommentFeedHub,
    pub votes: VoteService,
    pub bookmarks: BookmarkService,
    pub stances: StanceService,
}

impl AppState {
    /// Wire up every store over one database handle.
    pub fn new(config: Config, db: FirestoreDb, token_verifier: Arc<FirebaseTokenVerifier>) -> Self {
        let rants = RantService::new(db.clone());
        let comments = CommentService::new(db.clone(), rants.clone(), config.comment_poll_interval);

        Self {
            users: UserService::new(db.clone()),
            votes: VoteService::new(db.clone(), rants.clone()),
            bookmarks: BookmarkService::new(db.clone()),
            stances: StanceService::new(db.clone()),
            comment_feeds: CommentFeedHub::new(comments.clone(), COMMENT_FEED_WINDOW),
            comments,
            rants,
            token_verifier,
            db,
            config,
        }
    }
}
