// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Comment model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::rant::default_content_type;
use crate::models::{AuthorSnapshot, StanceValue};

/// Maximum comment length in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Comment document (`comments/{id}`), ordered chronologically per rant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Document ID (not stored as a field)
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub rant_id: String,
    pub author_id: String,
    #[serde(flatten)]
    pub author: AuthorSnapshot,

    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Commenter's stance on the rant when the comment was posted.
    #[serde(default)]
    pub author_stance: Option<StanceValue>,

    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub net_score: i64,

    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub reply_to_comment_id: Option<String>,
    #[serde(default)]
    pub reply_to_author_id: Option<String>,
    #[serde(default)]
    pub is_reply: bool,

    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Optional fields accepted when creating a comment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentOptions {
    pub content_type: Option<String>,
    pub reply_to_comment_id: Option<String>,
    pub reply_to_author_id: Option<String>,
}

/// The snapshot a live subscriber sees: soft-deleted comments removed,
/// oldest first.
pub fn visible_comments(window: Vec<Comment>) -> Vec<Comment> {
    let mut comments: Vec<Comment> = window.into_iter().filter(|c| !c.is_deleted).collect();
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    comments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_comment(id: &str, minutes_ago: i64, deleted: bool) -> Comment {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Comment {
            id: id.to_string(),
            rant_id: "rant".to_string(),
            author_id: "author".to_string(),
            author: AuthorSnapshot::default(),
            content: format!("comment {}", id),
            content_type: default_content_type(),
            author_stance: None,
            created_at: at,
            updated_at: at,
            upvotes: 0,
            downvotes: 0,
            net_score: 0,
            is_edited: false,
            is_deleted: deleted,
            deleted_at: None,
            reply_to_comment_id: None,
            reply_to_author_id: None,
            is_reply: false,
            mentions: vec![],
            hashtags: vec![],
        }
    }

    #[test]
    fn test_visible_comments_sorted_oldest_first() {
        let window = vec![
            make_comment("newest", 1, false),
            make_comment("oldest", 30, false),
            make_comment("middle", 10, false),
        ];

        let ids: Vec<_> = visible_comments(window)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_visible_comments_drops_soft_deleted() {
        let window = vec![
            make_comment("kept", 5, false),
            make_comment("gone", 3, true),
        ];

        let visible = visible_comments(window);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "kept");
    }

    #[test]
    fn test_document_round_trip_keeps_id_and_timestamps() {
        use chrono::TimeZone;

        let created = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let mut comment = make_comment("comment-1", 0, true);
        comment.created_at = created;
        comment.updated_at = created;
        comment.deleted_at = Some(created + Duration::hours(1));
        comment.author_stance = Some(StanceValue::Against);
        comment.author.author_name = "Ada".to_string();

        let doc = firestore::firestore_document_from_serializable(
            "projects/test-project/databases/(default)/documents/comments/comment-1",
            &comment,
        )
        .unwrap();
        assert!(!doc.fields.contains_key("id"));
        assert!(doc.fields.contains_key("authorName"));

        let back: Comment = firestore::firestore_document_to_serializable(&doc).unwrap();
        assert_eq!(back, comment);
    }
}
