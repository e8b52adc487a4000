// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Comment store and live comment subscriptions.
//!
//! A subscription polls the rant's raw comment window and hands the full
//! filtered, oldest-first snapshot to its callback whenever the window
//! changed since the previous read. Dropping the handle stops the poller.

use crate::db::{collections, CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::comment::{visible_comments, CommentOptions, MAX_COMMENT_CHARS};
use crate::models::rant::{default_content_type, RantStat};
use crate::models::user::UserStat;
use crate::models::{AuthorSnapshot, Comment};
use crate::services::RantService;
use crate::text::{extract_hashtags, extract_mentions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentEditPatch<'a> {
    content: Cow<'a, str>,
    hashtags: Cow<'a, [String]>,
    mentions: Cow<'a, [String]>,
    is_edited: bool,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

/// Handle to a running comment poller. Dropping it stops the poller.
#[derive(Debug)]
pub struct CommentSubscription {
    handle: JoinHandle<()>,
}

impl CommentSubscription {
    /// Stop delivering snapshots.
    pub fn unsubscribe(self) {}

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CommentSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct CommentService {
    db: FirestoreDb,
    rants: RantService,
    poll_interval: Duration,
}

impl CommentService {
    pub fn new(db: FirestoreDb, rants: RantService, poll_interval: Duration) -> Self {
        Self {
            db,
            rants,
            poll_interval,
        }
    }

    /// Post a comment on a live rant.
    ///
    /// Snapshots the author's display fields and current stance, and bumps
    /// the rant's and the author's comment counters in the same transaction.
    pub async fn create_comment(
        &self,
        author_id: &str,
        rant_id: &str,
        content: &str,
        options: CommentOptions,
    ) -> Result<Comment, AppError> {
        let content = validate_comment(content)?;
        self.rants.require_live_rant(rant_id).await?;

        let profile = match self.db.get_user_profile(author_id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user_id = %author_id, error = %e, "Author lookup failed, using fallback");
                None
            }
        };
        let author_stance = match self.db.get_stance(author_id, rant_id).await {
            Ok(stance) => stance.map(|s| s.stance),
            Err(e) => {
                tracing::warn!(user_id = %author_id, rant_id = %rant_id, error = %e, "Stance lookup failed");
                None
            }
        };

        let now = Utc::now();
        let is_reply = options.reply_to_comment_id.is_some();
        let comment = Comment {
            id: uuid::Uuid::new_v4().simple().to_string(),
            rant_id: rant_id.to_string(),
            author_id: author_id.to_string(),
            author: AuthorSnapshot::from_profile(profile.as_ref()),
            hashtags: extract_hashtags(&content),
            mentions: extract_mentions(&content),
            content,
            content_type: options.content_type.unwrap_or_else(default_content_type),
            author_stance,
            created_at: now,
            updated_at: now,
            upvotes: 0,
            downvotes: 0,
            net_score: 0,
            is_edited: false,
            is_deleted: false,
            deleted_at: None,
            reply_to_comment_id: options.reply_to_comment_id,
            reply_to_author_id: options.reply_to_author_id,
            is_reply,
        };

        let mut counters = vec![CounterChange::new(
            collections::RANTS,
            rant_id,
            RantStat::Comments.field(),
            1,
        )];
        if profile.is_some() {
            counters.push(CounterChange::new(
                collections::USERS,
                author_id,
                UserStat::CommentsCount.field(),
                1,
            ));
        }

        self.db.insert_comment(&comment, &counters).await?;

        tracing::info!(
            comment_id = %comment.id,
            rant_id = %rant_id,
            user_id = %author_id,
            stance = ?comment.author_stance,
            "Comment created"
        );

        self.rants.refresh_trending(rant_id).await;
        Ok(comment)
    }

    /// Live comments on a rant, oldest first, optionally after a timestamp.
    pub async fn get_comments_by_rant(
        &self,
        rant_id: &str,
        limit: u32,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Comment>, AppError> {
        self.db.list_comments_for_rant(rant_id, limit, after).await
    }

    /// Start polling the first `limit` comments of a rant.
    ///
    /// `callback` receives the visible snapshot once immediately and again
    /// after every change to the raw window. Read errors are logged and the
    /// poller keeps going.
    pub fn subscribe_to_comments<F>(
        &self,
        rant_id: &str,
        limit: u32,
        mut callback: F,
    ) -> CommentSubscription
    where
        F: FnMut(Vec<Comment>) + Send + 'static,
    {
        let db = self.db.clone();
        let rant_id = rant_id.to_string();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_window: Option<Vec<Comment>> = None;

            tracing::debug!(rant_id = %rant_id, limit, "Comment subscription started");

            loop {
                ticker.tick().await;

                let mut window = match db.list_comment_window(&rant_id, limit).await {
                    Ok(window) => window,
                    Err(e) => {
                        tracing::warn!(rant_id = %rant_id, error = %e, "Comment poll failed");
                        continue;
                    }
                };
                window.sort_by(|a, b| a.id.cmp(&b.id));

                if last_window.as_ref() == Some(&window) {
                    continue;
                }

                callback(visible_comments(window.clone()));
                last_window = Some(window);
            }
        });

        CommentSubscription { handle }
    }

    /// Author edit of the comment text.
    pub async fn update_comment(
        &self,
        comment_id: &str,
        content: &str,
        user_id: &str,
    ) -> Result<Comment, AppError> {
        let mut comment = self.require_owned_comment(comment_id, user_id, "edit").await?;
        let content = validate_comment(content)?;
        let now = Utc::now();

        let hashtags = extract_hashtags(&content);
        let mentions = extract_mentions(&content);
        let patch = CommentEditPatch {
            content: Cow::Borrowed(&content),
            hashtags: Cow::Borrowed(&hashtags),
            mentions: Cow::Borrowed(&mentions),
            is_edited: true,
            updated_at: now,
        };
        self.db
            .update_comment_fields(
                comment_id,
                &["content", "hashtags", "mentions", "isEdited", "updatedAt"],
                &patch,
            )
            .await?;

        comment.content = content;
        comment.hashtags = hashtags;
        comment.mentions = mentions;
        comment.is_edited = true;
        comment.updated_at = now;

        tracing::info!(comment_id = %comment_id, user_id = %user_id, "Comment updated");
        Ok(comment)
    }

    /// Author soft delete; decrements the rant's and the author's counters.
    pub async fn delete_comment(&self, comment_id: &str, user_id: &str) -> Result<(), AppError> {
        let comment = self
            .require_owned_comment(comment_id, user_id, "delete")
            .await?;
        if comment.is_deleted {
            return Ok(());
        }

        let mut counters = vec![CounterChange::new(
            collections::RANTS,
            &comment.rant_id,
            RantStat::Comments.field(),
            -1,
        )];
        if self.db.get_user_profile(user_id).await?.is_some() {
            counters.push(CounterChange::new(
                collections::USERS,
                user_id,
                UserStat::CommentsCount.field(),
                -1,
            ));
        }

        self.db
            .soft_delete_comment(comment_id, Utc::now(), &counters)
            .await?;

        tracing::info!(
            comment_id = %comment_id,
            rant_id = %comment.rant_id,
            user_id = %user_id,
            "Comment deleted"
        );

        self.rants.refresh_trending(&comment.rant_id).await;
        Ok(())
    }

    /// A user's live comments, newest first.
    pub async fn get_user_comments(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Comment>, AppError> {
        self.db.list_comments_by_author(user_id, limit).await
    }

    /// Number of live comments, counted from the documents.
    pub async fn get_comment_count(&self, rant_id: &str) -> Result<usize, AppError> {
        self.db.count_live_comments(rant_id).await
    }

    async fn require_owned_comment(
        &self,
        comment_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;

        if comment.author_id != user_id {
            return Err(AppError::Unauthorized(format!(
                "Unauthorized to {} this comment",
                action
            )));
        }
        Ok(comment)
    }
}

fn validate_comment(content: &str) -> Result<String, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidArgument(
            "Comment cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::InvalidArgument(format!(
            "Comment must be {} characters or less",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn offline_service() -> CommentService {
        let db = FirestoreDb::new_mock();
        CommentService::new(db.clone(), RantService::new(db), Duration::from_millis(10))
    }

    #[test]
    fn test_validate_comment() {
        assert_eq!(validate_comment(" ok ").unwrap(), "ok");
        assert!(validate_comment("\n\t").is_err());
        assert!(validate_comment(&"c".repeat(501)).is_err());
    }

    #[tokio::test]
    async fn test_empty_comment_rejected_before_io() {
        let err = offline_service()
            .create_comment("u1", "r1", "   ", CommentOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_failing_poll_never_calls_back() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let subscription = offline_service().subscribe_to_comments("r1", 50, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(subscription.is_active());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_poller() {
        let subscription = offline_service().subscribe_to_comments("r1", 50, |_| {});
        let handle_probe = subscription.handle.abort_handle();

        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle_probe.is_finished());
    }
}
