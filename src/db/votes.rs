// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vote document operations.

use super::collections;
use super::{CounterChange, FirestoreDb};
use crate::error::AppError;
use crate::models::{composite_id, Vote, VotePlan};
use chrono::{DateTime, Utc};

impl FirestoreDb {
    pub async fn get_vote(&self, user_id: &str, rant_id: &str) -> Result<Option<Vote>, AppError> {
        self.get_doc(collections::VOTES, &composite_id(user_id, rant_id))
            .await
    }

    /// Apply a planned toggle: the vote document change and the rant counter
    /// increments commit together or not at all.
    pub async fn apply_vote_plan(
        &self,
        user_id: &str,
        rant_id: &str,
        existing: Option<&Vote>,
        plan: &VotePlan,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let vote_id = composite_id(user_id, rant_id);
        let client = self.get_client()?;
        let mut transaction = self.begin_transaction().await?;

        match plan.vote_type {
            Some(vote_type) => {
                let mut vote = Vote::new(user_id, rant_id, vote_type, now);
                if let Some(created_at) = existing.and_then(|v| v.created_at) {
                    vote.created_at = Some(created_at);
                }

                client
                    .fluent()
                    .update()
                    .in_col(collections::VOTES)
                    .document_id(&vote_id)
                    .object(&vote)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add vote to transaction: {}", e))
                    })?;
            }
            None => {
                client
                    .fluent()
                    .delete()
                    .from(collections::VOTES)
                    .document_id(&vote_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add vote deletion to transaction: {}",
                            e
                        ))
                    })?;
            }
        }

        let counters: Vec<CounterChange> = plan
            .deltas
            .iter()
            .map(|(stat, delta)| CounterChange::new(collections::RANTS, rant_id, stat.field(), *delta))
            .collect();
        self.add_increments(&mut transaction, &counters)?;

        self.commit_transaction(transaction).await
    }

    /// Every vote cast on a rant.
    pub async fn list_votes_for_rant(&self, rant_id: &str) -> Result<Vec<Vote>, AppError> {
        let rant_id = rant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::VOTES)
            .filter(move |q| q.field("contentId").eq(rant_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
