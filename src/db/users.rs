// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and username reservation operations.

use super::collections;
use super::{CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::user::UserStat;
use crate::models::{UserProfile, UsernameRecord};
use serde::Serialize;

impl FirestoreDb {
    /// Get a profile by auth UID.
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        let profile: Option<UserProfile> = self.get_doc(collections::USERS, uid).await?;
        Ok(profile.map(|mut p| {
            p.uid = uid.to_string();
            p
        }))
    }

    /// Create or replace a profile document.
    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        self.upsert_doc(collections::USERS, &profile.uid, profile)
            .await
    }

    /// Overwrite selected profile fields.
    pub async fn update_user_profile_fields<T>(
        &self,
        uid: &str,
        fields: &[&str],
        patch: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        self.update_fields(collections::USERS, uid, fields, patch)
            .await
    }

    /// Look up a reservation by lowercase username.
    pub async fn get_username_record(
        &self,
        username_lower: &str,
    ) -> Result<Option<UsernameRecord>, AppError> {
        self.get_doc(collections::USERNAMES, username_lower).await
    }

    /// Claim a lowercase username. Returns `false` if someone already holds it.
    pub async fn reserve_username(
        &self,
        username_lower: &str,
        record: &UsernameRecord,
    ) -> Result<bool, AppError> {
        self.create_doc_if_absent(collections::USERNAMES, username_lower, record)
            .await
    }

    pub async fn release_username(&self, username_lower: &str) -> Result<(), AppError> {
        self.delete_doc(collections::USERNAMES, username_lower)
            .await
    }

    /// First `limit` reservations in username order.
    pub async fn list_username_records(&self, limit: u32) -> Result<Vec<UsernameRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERNAMES)
            .order_by([("username", firestore::FirestoreQueryDirection::Ascending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump a profile counter.
    ///
    /// Does nothing when the profile does not exist, so an increment never
    /// creates a bare profile document. Returns whether it was applied.
    pub async fn increment_user_stat(
        &self,
        uid: &str,
        stat: UserStat,
        delta: i64,
    ) -> Result<bool, AppError> {
        if !self.doc_exists(collections::USERS, uid).await? {
            tracing::debug!(user_id = %uid, field = stat.field(), "No profile, skipping stat update");
            return Ok(false);
        }

        self.apply_increments(&[CounterChange::new(
            collections::USERS,
            uid,
            stat.field(),
            delta,
        )])
        .await?;
        Ok(true)
    }
}
