// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Rant model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

/// Maximum rant body length in characters.
pub const MAX_CONTENT_CHARS: usize = 500;
/// Maximum rant title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

const FALLBACK_USERNAME: &str = "unknown";
const FALLBACK_NAME: &str = "Anonymous";

/// Author display fields copied onto a rant or comment when it is created.
///
/// This is a snapshot: later profile edits are not propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSnapshot {
    #[serde(default = "fallback_username")]
    pub author_username: String,
    #[serde(default = "fallback_name")]
    pub author_name: String,
    #[serde(rename = "authorPhotoURL", default)]
    pub author_photo_url: Option<String>,
}

fn fallback_username() -> String {
    FALLBACK_USERNAME.to_string()
}

fn fallback_name() -> String {
    FALLBACK_NAME.to_string()
}

impl Default for AuthorSnapshot {
    fn default() -> Self {
        Self {
            author_username: fallback_username(),
            author_name: fallback_name(),
            author_photo_url: None,
        }
    }
}

impl AuthorSnapshot {
    /// Snapshot a profile, or the anonymous fallback when there is none.
    pub fn from_profile(profile: Option<&UserProfile>) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };

        Self {
            author_username: non_empty(&profile.username).unwrap_or_else(fallback_username),
            author_name: non_empty(&profile.name).unwrap_or_else(fallback_name),
            author_photo_url: profile.photo_url.clone(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Who may see a rant. Anything other than `public` is kept out of listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Followers,
    Private,
    #[serde(other)]
    Unknown,
}

/// Rant document (`rants/{id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rant {
    /// Document ID (not stored as a field)
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub author_id: String,
    #[serde(flatten)]
    pub author: AuthorSnapshot,

    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,

    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,

    // ─── Engagement counters (caches, bumped by increments) ─────────
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub net_score: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub shares_count: i64,
    #[serde(default)]
    pub views_count: i64,

    // ─── Derived metadata ───────────────────────────────────────────
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,

    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default)]
    pub reply_to_rant_id: Option<String>,
    #[serde(default)]
    pub reply_to_author_id: Option<String>,
    #[serde(default)]
    pub is_reply: bool,

    // ─── Trending ───────────────────────────────────────────────────
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub trending_score: f64,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub last_engagement_at: Option<DateTime<Utc>>,
}

pub(crate) fn default_content_type() -> String {
    "text".to_string()
}

/// Optional fields accepted when creating a rant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RantOptions {
    pub title: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Option<Visibility>,
    pub reply_to_rant_id: Option<String>,
    pub reply_to_author_id: Option<String>,
}

/// Author edit; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RantUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
}

/// Counters on a rant that can be incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RantStat {
    Upvotes,
    Downvotes,
    Comments,
    Shares,
    Views,
}

impl RantStat {
    pub fn field(self) -> &'static str {
        match self {
            RantStat::Upvotes => "upvotes",
            RantStat::Downvotes => "downvotes",
            RantStat::Comments => "commentsCount",
            RantStat::Shares => "sharesCount",
            RantStat::Views => "viewsCount",
        }
    }

    /// Whether a change to this counter should refresh the trending score.
    pub fn affects_trending(self) -> bool {
        !matches!(self, RantStat::Views)
    }
}

/// Recomputed ranking fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    pub trending_score: f64,
    pub engagement_rate: f64,
    pub net_score: i64,
}

impl Rant {
    /// Whether the rant may appear in feed-style listings.
    pub fn is_listable(&self) -> bool {
        !self.is_deleted && self.visibility == Visibility::Public
    }

    /// Decaying engagement heuristic.
    ///
    /// `trendingScore = max(0, (up*2 + comments*3 - down) / (ageHours + 1))`,
    /// `engagementRate = (up + comments + shares) / views * 100` (0 without views).
    pub fn engagement(&self, now: DateTime<Utc>) -> Engagement {
        let age_hours = (now - self.created_at).num_milliseconds() as f64 / 3_600_000.0;
        let engagement_score =
            (self.upvotes * 2 + self.comments_count * 3 - self.downvotes) as f64;
        let trending_score = (engagement_score / (age_hours + 1.0)).max(0.0);

        let engagement_rate = if self.views_count > 0 {
            (self.upvotes + self.comments_count + self.shares_count) as f64
                / self.views_count as f64
                * 100.0
        } else {
            0.0
        };

        Engagement {
            trending_score,
            engagement_rate,
            net_score: self.upvotes - self.downvotes,
        }
    }
}

/// Keep only listable rants, preserving order.
pub fn listable(rants: Vec<Rant>) -> Vec<Rant> {
    rants.into_iter().filter(Rant::is_listable).collect()
}
