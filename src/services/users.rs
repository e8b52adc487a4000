// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: profiles, username reservations and profile counters.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::user::{
    first_validation_message, ProfileInput, ProfileUpdate, UserStatsSummary,
};
use crate::models::{UserProfile, UsernameRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::Validate;

/// How many of a user's rants are scanned for the upvote total.
const STATS_RANT_SCAN_LIMIT: u32 = 500;

/// Editable profile fields, written without touching counters.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfilePatch<'a> {
    name: Cow<'a, str>,
    username: Cow<'a, str>,
    display_username: Option<Cow<'a, str>>,
    bio: Cow<'a, str>,
    #[serde(rename = "photoURL")]
    photo_url: Option<Cow<'a, str>>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

const PROFILE_PATCH_FIELDS: [&str; 6] = [
    "name",
    "username",
    "displayUsername",
    "bio",
    "photoURL",
    "updatedAt",
];

#[derive(Clone)]
pub struct UserService {
    db: FirestoreDb,
}

impl UserService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Whether the user has finished profile setup.
    ///
    /// Read failures count as "no profile".
    pub async fn check_profile_exists(&self, uid: &str) -> bool {
        match self.db.get_user_profile(uid).await {
            Ok(Some(profile)) => profile.is_completed(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(user_id = %uid, error = %e, "Profile lookup failed");
                false
            }
        }
    }

    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.db.get_user_profile(uid).await
    }

    /// Resolve a username (any case) to its owner's profile.
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserProfile>, AppError> {
        let Some(record) = self
            .db
            .get_username_record(&username.trim().to_lowercase())
            .await?
        else {
            return Ok(None);
        };

        self.db.get_user_profile(&record.uid).await
    }

    /// Like [`Self::get_user_by_username`] but missing users are an error.
    pub async fn require_user_by_username(&self, username: &str) -> Result<UserProfile, AppError> {
        self.get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))
    }

    /// Whether nobody holds this username. Read failures report "taken".
    pub async fn is_username_available(&self, username: &str) -> bool {
        match self
            .db
            .get_username_record(&username.trim().to_lowercase())
            .await
        {
            Ok(record) => record.is_none(),
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Username lookup failed");
                false
            }
        }
    }

    /// Complete profile setup for a signed-in user.
    pub async fn create_user_profile(
        &self,
        uid: &str,
        email: Option<String>,
        input: ProfileInput,
    ) -> Result<UserProfile, AppError> {
        input
            .validate()
            .map_err(|e| AppError::InvalidArgument(first_validation_message(&e)))?;

        let display_username = input.username.trim().to_string();
        let username = display_username.to_lowercase();
        let now = Utc::now();

        let previous = self.db.get_user_profile(uid).await?;
        self.claim_username(uid, &username, &display_username, now)
            .await?;

        let profile = UserProfile {
            uid: uid.to_string(),
            name: input.name.trim().to_string(),
            username: username.clone(),
            display_username: Some(display_username),
            bio: input.bio.trim().to_string(),
            photo_url: input.photo_url,
            email: email.or_else(|| previous.as_ref().and_then(|p| p.email.clone())),
            rants_count: previous.as_ref().map_or(0, |p| p.rants_count),
            comments_count: previous.as_ref().map_or(0, |p| p.comments_count),
            followers_count: previous.as_ref().map_or(0, |p| p.followers_count),
            following_count: previous.as_ref().map_or(0, |p| p.following_count),
            profile_completed: Some(true),
            created_at: previous.as_ref().and_then(|p| p.created_at).or(Some(now)),
            updated_at: Some(now),
        };

        self.db.upsert_user_profile(&profile).await?;

        if let Some(old) = previous.filter(|p| !p.username.is_empty() && p.username != username) {
            self.release_username(&old.username).await;
        }

        tracing::info!(user_id = %uid, username = %profile.username, "Profile created");
        Ok(profile)
    }

    /// Apply a partial profile edit.
    pub async fn update_user_profile(
        &self,
        uid: &str,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AppError> {
        update
            .validate()
            .map_err(|e| AppError::InvalidArgument(first_validation_message(&e)))?;

        let mut profile = self
            .db
            .get_user_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
        let now = Utc::now();

        let mut released = None;
        if let Some(requested) = update.username.as_deref().map(str::trim) {
            let username = requested.to_lowercase();
            self.claim_username(uid, &username, requested, now).await?;
            if profile.username != username && !profile.username.is_empty() {
                released = Some(profile.username.clone());
            }
            profile.username = username;
            profile.display_username = Some(requested.to_string());
        }
        if let Some(name) = update.name {
            profile.name = name.trim().to_string();
        }
        if let Some(bio) = update.bio {
            profile.bio = bio.trim().to_string();
        }
        if let Some(photo_url) = update.photo_url {
            profile.photo_url = Some(photo_url);
        }
        profile.updated_at = Some(now);

        let patch = ProfilePatch {
            name: Cow::Borrowed(&profile.name),
            username: Cow::Borrowed(&profile.username),
            display_username: profile.display_username.as_deref().map(Cow::Borrowed),
            bio: Cow::Borrowed(&profile.bio),
            photo_url: profile.photo_url.as_deref().map(Cow::Borrowed),
            updated_at: now,
        };
        self.db
            .update_user_profile_fields(uid, &PROFILE_PATCH_FIELDS, &patch)
            .await?;

        if let Some(old) = released {
            self.release_username(&old).await;
        }

        tracing::info!(user_id = %uid, "Profile updated");
        Ok(profile)
    }

    /// Username records whose name contains `term`, from the first
    /// `max_results` in username order.
    pub async fn search_users(
        &self,
        term: &str,
        max_results: u32,
    ) -> Result<Vec<UsernameRecord>, AppError> {
        let term = term.trim().to_lowercase();
        let records = self.db.list_username_records(max_results).await?;

        Ok(records
            .into_iter()
            .filter(|record| {
                record.username.contains(&term)
                    || record
                        .display_username
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .collect())
    }

    /// Profile counters plus upvotes received across live rants.
    pub async fn get_user_stats(&self, uid: &str) -> Result<UserStatsSummary, AppError> {
        let profile = self
            .db
            .get_user_profile(uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        let rants = self
            .db
            .list_rants_by_author(uid, STATS_RANT_SCAN_LIMIT, None)
            .await?;
        let upvotes_received = rants
            .iter()
            .filter(|r| !r.is_deleted)
            .map(|r| r.upvotes)
            .sum();

        Ok(UserStatsSummary {
            rants_count: profile.rants_count,
            comments_count: profile.comments_count,
            upvotes_received,
        })
    }

    /// Reserve `username` for `uid`. Re-claiming your own name is a no-op.
    async fn claim_username(
        &self,
        uid: &str,
        username: &str,
        display_username: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(existing) = self.db.get_username_record(username).await? {
            if existing.uid == uid {
                return Ok(());
            }
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        let record = UsernameRecord {
            uid: uid.to_string(),
            username: username.to_string(),
            display_username: Some(display_username.to_string()),
            created_at: Some(now),
        };

        if !self.db.reserve_username(username, &record).await? {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        Ok(())
    }

    async fn release_username(&self, username: &str) {
        if let Err(e) = self.db.release_username(username).await {
            tracing::warn!(username = %username, error = %e, "Failed to release old username");
        }
    }
}
