// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vote store: the three-way vote toggle and vote lookups.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{VoteAction, VotePlan, VoteType};
use crate::services::RantService;
use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::collections::HashMap;

const MAX_CONCURRENT_VOTE_READS: usize = 20;

/// Result of a vote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub action: VoteAction,
    /// Vote held now (`null` after a toggle off)
    pub vote_type: Option<VoteType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_vote: Option<VoteType>,
}

impl From<&VotePlan> for VoteOutcome {
    fn from(plan: &VotePlan) -> Self {
        Self {
            action: plan.action,
            vote_type: plan.vote_type,
            previous_vote: plan.previous_vote,
        }
    }
}

#[derive(Clone)]
pub struct VoteService {
    db: FirestoreDb,
    rants: RantService,
}

impl VoteService {
    pub fn new(db: FirestoreDb, rants: RantService) -> Self {
        Self { db, rants }
    }

    /// Toggle the user's vote on a rant.
    ///
    /// The vote document and the rant counters change in one transaction.
    /// Two concurrent toggles by the same user can still both read the old
    /// state.
    pub async fn vote_on_rant(
        &self,
        user_id: &str,
        rant_id: &str,
        vote_type: &str,
    ) -> Result<VoteOutcome, AppError> {
        let requested: VoteType = vote_type.parse()?;
        self.rants.require_live_rant(rant_id).await?;

        let existing = self.db.get_vote(user_id, rant_id).await?;
        let plan = VotePlan::new(existing.as_ref().map(|v| v.vote_type), requested);

        self.db
            .apply_vote_plan(user_id, rant_id, existing.as_ref(), &plan, Utc::now())
            .await?;

        tracing::info!(
            user_id = %user_id,
            rant_id = %rant_id,
            action = ?plan.action,
            vote_type = %requested,
            "Vote applied"
        );

        self.rants.refresh_trending(rant_id).await;

        Ok(VoteOutcome::from(&plan))
    }

    /// Current vote, or `None`. Read failures report no vote.
    pub async fn get_user_vote(&self, user_id: &str, rant_id: &str) -> Option<VoteType> {
        match self.db.get_vote(user_id, rant_id).await {
            Ok(vote) => vote.map(|v| v.vote_type),
            Err(e) => {
                tracing::warn!(user_id = %user_id, rant_id = %rant_id, error = %e, "Vote lookup failed");
                None
            }
        }
    }

    /// Votes the user holds among `rant_ids`; rants without a vote are absent.
    pub async fn get_user_votes(
        &self,
        user_id: &str,
        rant_ids: &[String],
    ) -> HashMap<String, VoteType> {
        stream::iter(rant_ids.to_vec())
            .map(|rant_id| async move {
                let vote = self.get_user_vote(user_id, &rant_id).await;
                vote.map(|v| (rant_id, v))
            })
            .buffer_unordered(MAX_CONCURRENT_VOTE_READS)
            .filter_map(|entry| async move { entry })
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_previous_only_on_update() {
        let created = VoteOutcome::from(&VotePlan::new(None, VoteType::Upvote));
        assert_eq!(
            serde_json::to_value(&created).unwrap(),
            serde_json::json!({ "action": "created", "voteType": "upvote" })
        );

        let updated = VoteOutcome::from(&VotePlan::new(Some(VoteType::Upvote), VoteType::Downvote));
        assert_eq!(
            serde_json::to_value(&updated).unwrap(),
            serde_json::json!({
                "action": "updated",
                "voteType": "downvote",
                "previousVote": "upvote"
            })
        );

        let removed = VoteOutcome::from(&VotePlan::new(Some(VoteType::Upvote), VoteType::Upvote));
        assert_eq!(
            serde_json::to_value(&removed).unwrap(),
            serde_json::json!({ "action": "removed", "voteType": null })
        );
    }

    #[tokio::test]
    async fn test_invalid_vote_type_rejected_before_io() {
        let db = FirestoreDb::new_mock();
        let service = VoteService::new(db.clone(), RantService::new(db));

        let err = service
            .vote_on_rant("u1", "r1", "sideways")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_lookup_failures_report_no_vote() {
        let db = FirestoreDb::new_mock();
        let service = VoteService::new(db.clone(), RantService::new(db));

        assert_eq!(service.get_user_vote("u1", "r1").await, None);
        let votes = service
            .get_user_votes("u1", &["r1".to_string(), "r2".to_string()])
            .await;
        assert!(votes.is_empty());
    }
}
