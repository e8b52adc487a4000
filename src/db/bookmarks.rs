//! Bookmark document operations.

use super::collections;
use super::FirestoreDb;
use crate::error::AppError;
use crate::models::{composite_id, Bookmark};

impl FirestoreDb {
    pub async fn get_bookmark(
        &self,
        user_id: &str,
        rant_id: &str,
    ) -> Result<Option<Bookmark>, AppError> {
        self.get_doc(collections::BOOKMARKS, &composite_id(user_id, rant_id))
            .await
    }

    pub async fn set_bookmark(&self, bookmark: &Bookmark) -> Result<(), AppError> {
        self.upsert_doc(
            collections::BOOKMARKS,
            &composite_id(&bookmark.user_id, &bookmark.rant_id),
            bookmark,
        )
        .await
    }

    pub async fn delete_bookmark(&self, user_id: &str, rant_id: &str) -> Result<(), AppError> {
        self.delete_doc(collections::BOOKMARKS, &composite_id(user_id, rant_id))
            .await
    }

    /// All of a user's bookmarks, unordered.
    pub async fn list_bookmarks_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::BOOKMARKS)
            .filter(move |q| q.field("userId").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
