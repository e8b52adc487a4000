//! Bookmark model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookmark document (`bookmarks/{userId}_{rantId}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub user_id: String,
    pub rant_id: String,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Most recently saved first, then cap at `limit`.
///
/// Bookmarks without a timestamp sort last.
pub fn newest_rant_ids(mut bookmarks: Vec<Bookmark>, limit: usize) -> Vec<String> {
    bookmarks.sort_by_key(|b| std::cmp::Reverse(b.created_at));
    bookmarks
        .into_iter()
        .take(limit)
        .map(|b| b.rant_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bookmark(rant_id: &str, minutes_ago: i64) -> Bookmark {
        Bookmark {
            user_id: "u1".to_string(),
            rant_id: rant_id.to_string(),
            created_at: Some(Utc::now() - Duration::minutes(minutes_ago)),
        }
    }

    #[test]
    fn test_newest_first_then_limit() {
        let ids = newest_rant_ids(
            vec![bookmark("old", 60), bookmark("new", 1), bookmark("mid", 20)],
            2,
        );
        assert_eq!(ids, vec!["new", "mid"]);
    }
}
