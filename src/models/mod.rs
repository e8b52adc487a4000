// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.
//!
//! Field names are serialized in camelCase so documents stay compatible with
//! the existing collections written by the web client.

pub mod bookmark;
pub mod comment;
pub mod rant;
pub mod stance;
pub mod user;
pub mod vote;

pub use bookmark::Bookmark;
pub use comment::Comment;
pub use rant::{AuthorSnapshot, Rant, Visibility};
pub use stance::{Stance, StanceStats, StanceValue};
pub use user::{UserProfile, UsernameRecord};
pub use vote::{Vote, VoteAction, VotePlan, VoteType};

/// Document ID for a per-user relation on a target (`{userId}_{targetId}`).
///
/// The existence of a document under this ID is the uniqueness invariant for
/// votes, bookmarks and stances.
pub fn composite_id(user_id: &str, target_id: &str) -> String {
    format!("{}_{}", user_id, target_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_id_format() {
        assert_eq!(composite_id("u1", "r9"), "u1_r9");
    }
}
