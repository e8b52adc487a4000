// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bookmarks;
pub mod comment_feed;
pub mod comments;
pub mod firebase_auth;
pub mod rants;
pub mod stances;
pub mod users;
pub mod votes;

pub use bookmarks::BookmarkService;
pub use comment_feed::{CommentFeed, CommentFeedHub};
pub use comments::{CommentService, CommentSubscription};
pub use firebase_auth::{AuthUser, FirebaseTokenVerifier, TokenError};
pub use rants::{RantPage, RantService};
pub use stances::StanceService;
pub use users::UserService;
pub use votes::{VoteOutcome, VoteService};
