// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment document operations.

use super::collections;
use super::{CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::Comment;
use chrono::{DateTime, Utc};
use firestore::FirestoreQueryDirection;
use serde::{Deserialize, Serialize};

/// Fields written by a soft delete.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDeletion {
    is_deleted: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    deleted_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

impl FirestoreDb {
    pub async fn get_comment(&self, comment_id: &str) -> Result<Option<Comment>, AppError> {
        let comment: Option<Comment> = self.get_doc(collections::COMMENTS, comment_id).await?;
        Ok(comment.map(|mut c| {
            c.id = comment_id.to_string();
            c
        }))
    }

    /// Write a new comment and its counter increments in one transaction.
    pub async fn insert_comment(
        &self,
        comment: &Comment,
        counters: &[CounterChange],
    ) -> Result<(), AppError> {
        let mut transaction = self.begin_transaction().await?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::COMMENTS)
            .document_id(&comment.id)
            .object(comment)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add comment to transaction: {}", e))
            })?;

        self.add_increments(&mut transaction, counters)?;
        self.commit_transaction(transaction).await
    }

    /// Flag a comment deleted and apply the counter decrements in one transaction.
    pub async fn soft_delete_comment(
        &self,
        comment_id: &str,
        now: DateTime<Utc>,
        counters: &[CounterChange],
    ) -> Result<(), AppError> {
        let patch = CommentDeletion {
            is_deleted: true,
            deleted_at: now,
            updated_at: now,
        };

        let mut transaction = self.begin_transaction().await?;

        self.get_client()?
            .fluent()
            .update()
            .fields(["isDeleted", "deletedAt", "updatedAt"])
            .in_col(collections::COMMENTS)
            .document_id(comment_id)
            .object(&patch)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add deletion to transaction: {}", e))
            })?;

        self.add_increments(&mut transaction, counters)?;
        self.commit_transaction(transaction).await
    }

    /// Up to `limit` comments on a rant, unordered and unfiltered.
    ///
    /// This is the raw window a live subscription watches.
    pub async fn list_comment_window(
        &self,
        rant_id: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let rant_id = rant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| q.field("rantId").eq(rant_id.clone()))
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Live comments on a rant, oldest first.
    pub async fn list_comments_for_rant(
        &self,
        rant_id: &str,
        limit: u32,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Comment>, AppError> {
        let rant_id = rant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("rantId").eq(rant_id.clone()),
                    q.field("isDeleted").eq(false),
                    after.and_then(|after| {
                        q.field("createdAt")
                            .greater_than(firestore::FirestoreTimestamp(after))
                    }),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's live comments, newest first.
    pub async fn list_comments_by_author(
        &self,
        author_id: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        let author_id = author_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("authorId").eq(author_id.clone()),
                    q.field("isDeleted").eq(false),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of live comments on a rant (full scan of the matches).
    pub async fn count_live_comments(&self, rant_id: &str) -> Result<usize, AppError> {
        let rant_id = rant_id.to_string();
        let comments: Vec<Comment> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMMENTS)
            .filter(move |q| {
                q.for_all([
                    q.field("rantId").eq(rant_id.clone()),
                    q.field("isDeleted").eq(false),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(comments.len())
    }

    /// Overwrite selected comment fields.
    pub async fn update_comment_fields<T>(
        &self,
        comment_id: &str,
        fields: &[&str],
        patch: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        self.update_fields(collections::COMMENTS, comment_id, fields, patch)
            .await
    }
}
