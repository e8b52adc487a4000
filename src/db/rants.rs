// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rant document operations.
//!
//! Listing queries use at most one equality filter plus one ordering, and
//! leave soft-delete and visibility filtering to the caller.

use super::collections;
use super::{CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::Rant;
use chrono::{DateTime, Utc};
use firestore::{FirestoreQueryDirection, FirestoreTimestamp};
use serde::Serialize;

impl FirestoreDb {
    /// Get a rant by ID, including soft-deleted ones.
    pub async fn get_rant(&self, rant_id: &str) -> Result<Option<Rant>, AppError> {
        let rant: Option<Rant> = self.get_doc(collections::RANTS, rant_id).await?;
        Ok(rant.map(|mut r| {
            r.id = rant_id.to_string();
            r
        }))
    }

    /// Write a new rant together with the counter increments it causes.
    pub async fn insert_rant(&self, rant: &Rant, counters: &[CounterChange]) -> Result<(), AppError> {
        let mut transaction = self.begin_transaction().await?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::RANTS)
            .document_id(&rant.id)
            .object(rant)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add rant to transaction: {}", e)))?;

        self.add_increments(&mut transaction, counters)?;
        self.commit_transaction(transaction).await
    }

    /// Most recently created rants, optionally strictly older than `before`.
    pub async fn list_recent_rants(
        &self,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Rant>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::RANTS);

        let query = match before {
            Some(before) => query.filter(move |q| {
                q.field("createdAt")
                    .less_than(FirestoreTimestamp(before))
            }),
            None => query,
        };

        query
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's rants, newest first.
    pub async fn list_rants_by_author(
        &self,
        author_id: &str,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Rant>, AppError> {
        let author_id = author_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RANTS)
            .filter(move |q| {
                q.for_all([
                    q.field("authorId").eq(author_id.clone()),
                    before.and_then(|before| {
                        q.field("createdAt")
                            .less_than(FirestoreTimestamp(before))
                    }),
                ])
            })
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Highest trending score first.
    pub async fn list_trending_rants(&self, limit: u32) -> Result<Vec<Rant>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RANTS)
            .order_by([("trendingScore", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Rants carrying a (lowercase) hashtag, newest first.
    pub async fn list_rants_by_hashtag(&self, tag: &str, limit: u32) -> Result<Vec<Rant>, AppError> {
        let tag = tag.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RANTS)
            .filter(move |q| q.field("hashtags").array_contains(tag.clone()))
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reply rants pointing at `rant_id`, oldest first.
    pub async fn list_replies(&self, rant_id: &str, limit: u32) -> Result<Vec<Rant>, AppError> {
        let rant_id = rant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::RANTS)
            .filter(move |q| q.field("replyToRantId").eq(rant_id.clone()))
            .order_by([("createdAt", FirestoreQueryDirection::Ascending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite selected rant fields.
    pub async fn update_rant_fields<T>(
        &self,
        rant_id: &str,
        fields: &[&str],
        patch: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        self.update_fields(collections::RANTS, rant_id, fields, patch)
            .await
    }
}
