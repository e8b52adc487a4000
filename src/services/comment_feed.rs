// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared live comment feeds.
//!
//! Every viewer of the same rant shares one poller. A feed lives as long as
//! somebody holds its `Arc`; the hub only keeps weak references.

use crate::models::Comment;
use crate::services::comments::{CommentService, CommentSubscription};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Latest visible snapshot; `None` until the first successful poll.
pub type CommentSnapshot = Option<Arc<Vec<Comment>>>;

/// One rant's live comment feed.
pub struct CommentFeed {
    rant_id: String,
    snapshots: watch::Receiver<CommentSnapshot>,
    _subscription: CommentSubscription,
}

impl CommentFeed {
    pub fn rant_id(&self) -> &str {
        &self.rant_id
    }

    /// A receiver positioned at the current snapshot.
    pub fn receiver(&self) -> watch::Receiver<CommentSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> CommentSnapshot {
        self.snapshots.borrow().clone()
    }
}

pub struct CommentFeedHub {
    comments: CommentService,
    window: u32,
    feeds: DashMap<String, Weak<CommentFeed>>,
}

impl CommentFeedHub {
    pub fn new(comments: CommentService, window: u32) -> Self {
        Self {
            comments,
            window,
            feeds: DashMap::new(),
        }
    }

    /// Join (or start) the feed for a rant.
    pub fn watch(&self, rant_id: &str) -> Arc<CommentFeed> {
        if let Some(feed) = self.feeds.get(rant_id).and_then(|weak| weak.upgrade()) {
            return feed;
        }

        self.prune();

        match self.feeds.entry(rant_id.to_string()) {
            Entry::Occupied(mut entry) => match entry.get().upgrade() {
                Some(feed) => feed,
                None => {
                    let feed = self.start(rant_id);
                    entry.insert(Arc::downgrade(&feed));
                    feed
                }
            },
            Entry::Vacant(entry) => {
                let feed = self.start(rant_id);
                entry.insert(Arc::downgrade(&feed));
                feed
            }
        }
    }

    /// Number of feeds with at least one viewer.
    #[cfg(test)]
    pub(crate) fn active_feeds(&self) -> usize {
        self.feeds
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    fn prune(&self) {
        self.feeds.retain(|_, weak| weak.strong_count() > 0);
    }

    fn start(&self, rant_id: &str) -> Arc<CommentFeed> {
        let (sender, receiver) = watch::channel(None);
        let subscription = self
            .comments
            .subscribe_to_comments(rant_id, self.window, move |comments| {
                sender.send_replace(Some(Arc::new(comments)));
            });

        tracing::debug!(rant_id = %rant_id, "Started shared comment feed");

        Arc::new(CommentFeed {
            rant_id: rant_id.to_string(),
            snapshots: receiver,
            _subscription: subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::FirestoreDb;
    use crate::services::RantService;
    use std::time::Duration;

    fn hub() -> CommentFeedHub {
        let db = FirestoreDb::new_mock();
        let comments =
            CommentService::new(db.clone(), RantService::new(db), Duration::from_millis(10));
        CommentFeedHub::new(comments, 50)
    }

    #[tokio::test]
    async fn test_viewers_share_one_feed() {
        let hub = hub();
        let first = hub.watch("r1");
        let second = hub.watch("r1");
        let other = hub.watch("r2");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(hub.active_feeds(), 2);
        assert!(first.latest().is_none());
        assert_eq!(first.rant_id(), "r1");
    }

    #[tokio::test]
    async fn test_feed_released_when_last_viewer_leaves() {
        let hub = hub();
        let feed = hub.watch("r1");
        drop(feed);

        assert_eq!(hub.active_feeds(), 0);

        let restarted = hub.watch("r1");
        assert_eq!(hub.active_feeds(), 1);
        drop(restarted);
    }
}
