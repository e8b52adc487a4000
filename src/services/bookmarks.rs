//! Bookmark store: a user's saved rants.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::bookmark::newest_rant_ids;
use crate::models::{Bookmark, Rant};
use chrono::Utc;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_RANT_READS: usize = 10;

#[derive(Clone)]
pub struct BookmarkService {
    db: FirestoreDb,
}

impl BookmarkService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn add_bookmark(&self, user_id: &str, rant_id: &str) -> Result<(), AppError> {
        let bookmark = Bookmark {
            user_id: user_id.to_string(),
            rant_id: rant_id.to_string(),
            created_at: Some(Utc::now()),
        };
        self.db.set_bookmark(&bookmark).await
    }

    pub async fn remove_bookmark(&self, user_id: &str, rant_id: &str) -> Result<(), AppError> {
        self.db.delete_bookmark(user_id, rant_id).await
    }

    /// Read failures report "not bookmarked".
    pub async fn is_bookmarked(&self, user_id: &str, rant_id: &str) -> bool {
        match self.db.get_bookmark(user_id, rant_id).await {
            Ok(bookmark) => bookmark.is_some(),
            Err(e) => {
                tracing::warn!(user_id = %user_id, rant_id = %rant_id, error = %e, "Bookmark lookup failed");
                false
            }
        }
    }

    /// Flip the bookmark and return the new state.
    pub async fn toggle_bookmark(&self, user_id: &str, rant_id: &str) -> Result<bool, AppError> {
        let bookmarked = self.db.get_bookmark(user_id, rant_id).await?.is_some();

        if bookmarked {
            self.remove_bookmark(user_id, rant_id).await?;
        } else {
            self.add_bookmark(user_id, rant_id).await?;
        }

        tracing::info!(user_id = %user_id, rant_id = %rant_id, bookmarked = !bookmarked, "Bookmark toggled");
        Ok(!bookmarked)
    }

    /// Rant IDs the user saved, most recent first.
    pub async fn get_user_bookmarks(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, AppError> {
        let bookmarks = self.db.list_bookmarks_for_user(user_id).await?;
        Ok(newest_rant_ids(bookmarks, limit))
    }

    /// Saved rants, most recent first, skipping missing and deleted ones.
    pub async fn get_bookmarked_rants(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Rant>, AppError> {
        let rant_ids = self.get_user_bookmarks(user_id, limit).await?;

        let results: Vec<Result<Option<Rant>, AppError>> = stream::iter(rant_ids)
            .map(|rant_id| async move { self.db.get_rant(&rant_id).await })
            .buffered(MAX_CONCURRENT_RANT_READS)
            .collect()
            .await;

        let mut rants = Vec::new();
        for result in results {
            if let Some(rant) = result?.filter(|r| !r.is_deleted) {
                rants.push(rant);
            }
        }
        Ok(rants)
    }
}
