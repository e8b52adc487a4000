// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rant store: authoring, listings, counters and trending.

use crate::db::{collections, CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::rant::{
    default_content_type, listable, Engagement, RantOptions, RantStat, RantUpdate,
    MAX_CONTENT_CHARS, MAX_TITLE_CHARS,
};
use crate::models::user::UserStat;
use crate::models::{AuthorSnapshot, Rant, VoteType, Visibility};
use crate::text::{extract_hashtags, extract_mentions, normalize_hashtag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on replies scanned when recounting a rant's comments.
const RECONCILE_REPLY_SCAN_LIMIT: u32 = 1000;

/// One page of a newest-first listing.
#[derive(Debug, Clone)]
pub struct RantPage {
    pub rants: Vec<Rant>,
    /// Creation time of the last raw document read, for the next page.
    pub next_cursor: Option<DateTime<Utc>>,
    /// The raw page was full, so older documents may exist.
    pub has_more: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngagementPatch {
    trending_score: f64,
    engagement_rate: f64,
    net_score: i64,
    #[serde(with = "firestore::serialize_as_timestamp")]
    last_engagement_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RantEditPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashtags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mentions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
    is_edited: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RantDeletionPatch {
    is_deleted: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CounterPatch {
    upvotes: i64,
    downvotes: i64,
    comments_count: i64,
}

#[derive(Clone)]
pub struct RantService {
    db: FirestoreDb,
}

impl RantService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Publish a rant.
    ///
    /// Author display fields are snapshotted from the profile; a missing or
    /// unreadable profile falls back to the anonymous snapshot.
    pub async fn create_rant(
        &self,
        author_id: &str,
        content: &str,
        options: RantOptions,
    ) -> Result<Rant, AppError> {
        let content = validate_content(content)?;
        let title = validate_title(options.title)?;
        let visibility = validate_visibility(options.visibility.unwrap_or_default())?;

        if let Some(parent_id) = options.reply_to_rant_id.as_deref() {
            self.require_live_rant(parent_id).await?;
        }

        let profile = match self.db.get_user_profile(author_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %author_id, error = %e, "Author lookup failed, using fallback");
                None
            }
        };

        let now = Utc::now();
        let is_reply = options.reply_to_rant_id.is_some();
        let rant = Rant {
            id: uuid::Uuid::new_v4().simple().to_string(),
            author_id: author_id.to_string(),
            author: AuthorSnapshot::from_profile(profile.as_ref()),
            title,
            hashtags: extract_hashtags(&content),
            mentions: extract_mentions(&content),
            content,
            content_type: options.content_type.unwrap_or_else(default_content_type),
            created_at: now,
            updated_at: now,
            upvotes: 0,
            downvotes: 0,
            net_score: 0,
            comments_count: 0,
            shares_count: 0,
            views_count: 0,
            tags: options.tags,
            is_edited: false,
            is_deleted: false,
            is_pinned: false,
            visibility,
            reply_to_rant_id: options.reply_to_rant_id,
            reply_to_author_id: options.reply_to_author_id,
            is_reply,
            engagement_rate: 0.0,
            trending_score: 0.0,
            last_engagement_at: Some(now),
        };

        let mut counters = Vec::new();
        if profile.is_some() {
            counters.push(CounterChange::new(
                collections::USERS,
                author_id,
                UserStat::RantsCount.field(),
                1,
            ));
        }
        if let Some(parent_id) = rant.reply_to_rant_id.as_deref() {
            counters.push(CounterChange::new(
                collections::RANTS,
                parent_id,
                RantStat::Comments.field(),
                1,
            ));
        }

        self.db.insert_rant(&rant, &counters).await?;

        tracing::info!(
            rant_id = %rant.id,
            user_id = %author_id,
            hashtags = rant.hashtags.len(),
            is_reply,
            "Rant created"
        );

        if let Some(parent_id) = rant.reply_to_rant_id.as_deref() {
            self.refresh_trending(parent_id).await;
        }

        Ok(rant)
    }

    /// Any rant by ID, including soft-deleted ones.
    pub async fn get_rant(&self, rant_id: &str) -> Result<Option<Rant>, AppError> {
        self.db.get_rant(rant_id).await
    }

    /// A rant that exists and is not soft-deleted.
    pub async fn require_live_rant(&self, rant_id: &str) -> Result<Rant, AppError> {
        self.db
            .get_rant(rant_id)
            .await?
            .filter(|r| !r.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("Rant {} not found", rant_id)))
    }

    /// Newest rants, filtered to listable ones after the fetch.
    ///
    /// The page may hold fewer than `limit` rants.
    pub async fn get_feed(
        &self,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<RantPage, AppError> {
        let raw = self.db.list_recent_rants(limit, before).await?;
        Ok(page_from_raw(raw, limit as usize, limit as usize, Rant::is_listable))
    }

    /// A user's rants, newest first, soft-deleted ones removed.
    pub async fn get_user_rants(
        &self,
        user_id: &str,
        limit: u32,
        before: Option<DateTime<Utc>>,
    ) -> Result<RantPage, AppError> {
        let fetch = limit.saturating_mul(2);
        let raw = self.db.list_rants_by_author(user_id, fetch, before).await?;
        Ok(page_from_raw(raw, fetch as usize, limit as usize, |r| {
            !r.is_deleted
        }))
    }

    /// Highest trending score first, listable only.
    pub async fn get_trending_rants(&self, limit: u32) -> Result<Vec<Rant>, AppError> {
        let raw = self
            .db
            .list_trending_rants(limit.saturating_mul(2))
            .await?;
        Ok(capped(listable(raw), limit))
    }

    pub async fn search_by_hashtag(&self, tag: &str, limit: u32) -> Result<Vec<Rant>, AppError> {
        let tag = normalize_hashtag(tag);
        if tag.is_empty() {
            return Err(AppError::InvalidArgument("Hashtag cannot be empty".to_string()));
        }

        let raw = self
            .db
            .list_rants_by_hashtag(&tag, limit.saturating_mul(2))
            .await?;
        Ok(capped(listable(raw), limit))
    }

    /// Replies to a rant, oldest first.
    pub async fn get_replies(&self, rant_id: &str, limit: u32) -> Result<Vec<Rant>, AppError> {
        let raw = self
            .db
            .list_replies(rant_id, limit.saturating_mul(2))
            .await?;
        Ok(capped(listable(raw), limit))
    }

    /// Author edit. Changing the content re-derives hashtags and mentions.
    pub async fn update_rant(
        &self,
        rant_id: &str,
        update: RantUpdate,
        user_id: &str,
    ) -> Result<Rant, AppError> {
        let mut rant = self.require_owned_rant(rant_id, user_id, "edit").await?;
        let now = Utc::now();

        let mut patch = RantEditPatch {
            title: None,
            content: None,
            hashtags: None,
            mentions: None,
            tags: None,
            visibility: None,
            is_edited: true,
            updated_at: now,
        };
        let mut fields = vec!["isEdited", "updatedAt"];

        if let Some(content) = update.content.as_deref() {
            let content = validate_content(content)?;
            patch.hashtags = Some(extract_hashtags(&content));
            patch.mentions = Some(extract_mentions(&content));
            patch.content = Some(content);
            fields.extend(["content", "hashtags", "mentions"]);
        }
        if update.title.is_some() {
            patch.title = validate_title(update.title)?;
            if patch.title.is_some() {
                fields.push("title");
            }
        }
        if let Some(tags) = update.tags {
            patch.tags = Some(tags);
            fields.push("tags");
        }
        if let Some(visibility) = update.visibility {
            patch.visibility = Some(validate_visibility(visibility)?);
            fields.push("visibility");
        }

        self.db.update_rant_fields(rant_id, &fields, &patch).await?;

        if let Some(content) = patch.content {
            rant.content = content;
        }
        if let Some(hashtags) = patch.hashtags {
            rant.hashtags = hashtags;
        }
        if let Some(mentions) = patch.mentions {
            rant.mentions = mentions;
        }
        if patch.title.is_some() {
            rant.title = patch.title;
        }
        if let Some(tags) = patch.tags {
            rant.tags = tags;
        }
        if let Some(visibility) = patch.visibility {
            rant.visibility = visibility;
        }
        rant.is_edited = true;
        rant.updated_at = now;

        tracing::info!(rant_id = %rant_id, user_id = %user_id, "Rant updated");
        Ok(rant)
    }

    /// Author soft delete. The rant stays readable by ID but leaves listings.
    pub async fn delete_rant(&self, rant_id: &str, user_id: &str) -> Result<(), AppError> {
        let rant = self.require_owned_rant(rant_id, user_id, "delete").await?;
        if rant.is_deleted {
            return Ok(());
        }

        let patch = RantDeletionPatch {
            is_deleted: true,
            updated_at: Utc::now(),
        };
        self.db
            .update_rant_fields(rant_id, &["isDeleted", "updatedAt"], &patch)
            .await?;

        self.db
            .increment_user_stat(user_id, UserStat::RantsCount, -1)
            .await?;

        tracing::info!(rant_id = %rant_id, user_id = %user_id, "Rant deleted");
        Ok(())
    }

    /// Bump one counter; engagement counters also refresh the trending score.
    pub async fn increment_rant_stat(
        &self,
        rant_id: &str,
        stat: RantStat,
        delta: i64,
    ) -> Result<(), AppError> {
        self.db
            .apply_increments(&[CounterChange::new(
                collections::RANTS,
                rant_id,
                stat.field(),
                delta,
            )])
            .await?;

        tracing::debug!(rant_id = %rant_id, field = stat.field(), delta, "Rant counter updated");

        if stat.affects_trending() {
            self.refresh_trending(rant_id).await;
        }
        Ok(())
    }

    pub async fn record_view(&self, rant_id: &str) -> Result<(), AppError> {
        self.require_live_rant(rant_id).await?;
        self.increment_rant_stat(rant_id, RantStat::Views, 1).await
    }

    pub async fn record_share(&self, rant_id: &str) -> Result<(), AppError> {
        self.require_live_rant(rant_id).await?;
        self.increment_rant_stat(rant_id, RantStat::Shares, 1).await
    }

    /// Recompute and store trending score, engagement rate and net score.
    ///
    /// Returns `None` when the rant does not exist.
    pub async fn update_trending_score(
        &self,
        rant_id: &str,
    ) -> Result<Option<Engagement>, AppError> {
        let Some(rant) = self.db.get_rant(rant_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let engagement = rant.engagement(now);
        let patch = EngagementPatch {
            trending_score: engagement.trending_score,
            engagement_rate: engagement.engagement_rate,
            net_score: engagement.net_score,
            last_engagement_at: now,
        };

        self.db
            .update_rant_fields(
                rant_id,
                &["trendingScore", "engagementRate", "netScore", "lastEngagementAt"],
                &patch,
            )
            .await?;

        tracing::debug!(
            rant_id = %rant_id,
            trending_score = engagement.trending_score,
            "Trending score updated"
        );
        Ok(Some(engagement))
    }

    /// Best-effort trending refresh: failures are logged, never raised.
    pub async fn refresh_trending(&self, rant_id: &str) {
        if let Err(e) = self.update_trending_score(rant_id).await {
            tracing::warn!(rant_id = %rant_id, error = %e, "Trending refresh failed");
        }
    }

    /// Recount vote and comment counters from their source documents.
    ///
    /// Only the author may trigger this.
    pub async fn reconcile_rant_counters(
        &self,
        rant_id: &str,
        user_id: &str,
    ) -> Result<Rant, AppError> {
        let mut rant = self.require_owned_rant(rant_id, user_id, "reconcile").await?;

        let votes = self.db.list_votes_for_rant(rant_id).await?;
        let upvotes = votes
            .iter()
            .filter(|v| v.vote_type == VoteType::Upvote)
            .count() as i64;
        let downvotes = votes.len() as i64 - upvotes;

        let comments = self.db.count_live_comments(rant_id).await? as i64;
        let replies = self
            .db
            .list_replies(rant_id, RECONCILE_REPLY_SCAN_LIMIT)
            .await?
            .iter()
            .filter(|r| !r.is_deleted)
            .count() as i64;

        let patch = CounterPatch {
            upvotes,
            downvotes,
            comments_count: comments + replies,
        };

        if rant.upvotes != patch.upvotes
            || rant.downvotes != patch.downvotes
            || rant.comments_count != patch.comments_count
        {
            tracing::warn!(
                rant_id = %rant_id,
                upvotes = rant.upvotes,
                downvotes = rant.downvotes,
                comments_count = rant.comments_count,
                recounted_upvotes = patch.upvotes,
                recounted_downvotes = patch.downvotes,
                recounted_comments = patch.comments_count,
                "Rant counters drifted, repairing"
            );
        }

        self.db
            .update_rant_fields(
                rant_id,
                &["upvotes", "downvotes", "commentsCount"],
                &patch,
            )
            .await?;

        rant.upvotes = patch.upvotes;
        rant.downvotes = patch.downvotes;
        rant.comments_count = patch.comments_count;

        if let Some(engagement) = self.update_trending_score(rant_id).await? {
            rant.trending_score = engagement.trending_score;
            rant.engagement_rate = engagement.engagement_rate;
            rant.net_score = engagement.net_score;
        }

        Ok(rant)
    }

    async fn require_owned_rant(
        &self,
        rant_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<Rant, AppError> {
        let rant = self
            .db
            .get_rant(rant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rant {} not found", rant_id)))?;

        if rant.author_id != user_id {
            return Err(AppError::Unauthorized(format!(
                "Unauthorized to {} this rant",
                action
            )));
        }
        Ok(rant)
    }
}

fn validate_content(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidArgument(
            "Rant content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::InvalidArgument(format!(
            "Rant content must be {} characters or less",
            MAX_CONTENT_CHARS
        )));
    }
    Ok(content.to_string())
}

fn validate_title(title: Option<String>) -> Result<Option<String>, AppError> {
    let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::InvalidArgument(format!(
            "Title must be {} characters or less",
            MAX_TITLE_CHARS
        )));
    }
    Ok(Some(title))
}

fn validate_visibility(visibility: Visibility) -> Result<Visibility, AppError> {
    if visibility == Visibility::Unknown {
        return Err(AppError::InvalidArgument(
            "Visibility must be 'public', 'followers' or 'private'".to_string(),
        ));
    }
    Ok(visibility)
}

fn capped(mut rants: Vec<Rant>, limit: u32) -> Vec<Rant> {
    rants.truncate(limit as usize);
    rants
}

/// Build a page from a raw newest-first read of `fetched` documents.
fn page_from_raw(
    raw: Vec<Rant>,
    fetched: usize,
    limit: usize,
    keep: impl Fn(&Rant) -> bool,
) -> RantPage {
    let mut has_more = fetched > 0 && raw.len() == fetched;
    let mut next_cursor = raw.last().map(|r| r.created_at);
    let total = raw.len();
    let mut rants = Vec::with_capacity(limit.min(total));

    for (i, rant) in raw.into_iter().enumerate() {
        if !keep(&rant) {
            continue;
        }
        rants.push(rant);
        if rants.len() == limit {
            // Resume after the last returned rant, not the last one read.
            if i + 1 < total {
                next_cursor = rants.last().map(|r| r.created_at);
                has_more = true;
            }
            break;
        }
    }

    RantPage {
        rants,
        next_cursor,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rant::tests::make_rant;
    use chrono::Duration;

    #[test]
    fn test_validate_content() {
        assert_eq!(validate_content("  hi  ").unwrap(), "hi");
        assert!(matches!(
            validate_content("   "),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(validate_content(&"é".repeat(500)).is_ok());
        assert!(validate_content(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title(None).unwrap(), None);
        assert_eq!(validate_title(Some("  ".to_string())).unwrap(), None);
        assert_eq!(
            validate_title(Some(" Why ".to_string())).unwrap(),
            Some("Why".to_string())
        );
        assert!(validate_title(Some("t".repeat(101))).is_err());
    }

    #[test]
    fn test_unknown_visibility_rejected() {
        assert!(validate_visibility(Visibility::Unknown).is_err());
        assert_eq!(
            validate_visibility(Visibility::Private).unwrap(),
            Visibility::Private
        );
    }

    #[test]
    fn test_feed_page_filters_after_fetch() {
        let now = Utc::now();
        let mut deleted = make_rant("deleted", now - Duration::minutes(1));
        deleted.is_deleted = true;
        let mut private = make_rant("private", now - Duration::minutes(2));
        private.visibility = Visibility::Private;
        let raw = vec![
            make_rant("a", now),
            deleted,
            private,
            make_rant("b", now - Duration::minutes(3)),
        ];
        let oldest = raw[3].created_at;

        let page = page_from_raw(raw, 4, 4, Rant::is_listable);
        let ids: Vec<_> = page.rants.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, Some(oldest));
    }

    #[test]
    fn test_short_raw_page_has_no_more() {
        let now = Utc::now();
        let page = page_from_raw(vec![make_rant("a", now)], 20, 10, |r| !r.is_deleted);
        assert!(!page.has_more);
        assert_eq!(page.rants.len(), 1);
    }

    #[test]
    fn test_user_page_caps_at_limit() {
        let now = Utc::now();
        let raw: Vec<_> = (0..6)
            .map(|i| make_rant(&format!("r{}", i), now - Duration::minutes(i)))
            .collect();

        let third = raw[2].created_at;

        let page = page_from_raw(raw, 6, 3, |r| !r.is_deleted);
        assert_eq!(page.rants.len(), 3);
        assert!(page.has_more);
        assert_eq!(page.rants[0].id, "r0");
        assert_eq!(page.next_cursor, Some(third));
    }

    #[test]
    fn test_truncated_short_read_still_has_more() {
        let now = Utc::now();
        let mut raw: Vec<_> = (0..5)
            .map(|i| make_rant(&format!("r{}", i), now - Duration::minutes(i)))
            .collect();
        raw[1].is_deleted = true;
        let fourth = raw[3].created_at;

        // Fewer documents than requested, but two live ones were left unread.
        let page = page_from_raw(raw, 10, 3, |r| !r.is_deleted);
        let ids: Vec<_> = page.rants.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r2", "r3"]);
        assert!(page.has_more);
        assert_eq!(page.next_cursor, Some(fourth));
    }

    #[test]
    fn test_limit_hit_on_last_raw_document_keeps_raw_cursor() {
        let now = Utc::now();
        let raw: Vec<_> = (0..3)
            .map(|i| make_rant(&format!("r{}", i), now - Duration::minutes(i)))
            .collect();
        let last = raw[2].created_at;

        let page = page_from_raw(raw, 6, 3, |r| !r.is_deleted);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, Some(last));
    }
}
