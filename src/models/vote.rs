// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Vote model and the three-way toggle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::rant::RantStat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }

    /// Rant counter tracking this vote type.
    pub fn counter(self) -> RantStat {
        match self {
            VoteType::Upvote => RantStat::Upvotes,
            VoteType::Downvote => RantStat::Downvotes,
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(VoteType::Upvote),
            "downvote" => Ok(VoteType::Downvote),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid vote type '{}'. Must be 'upvote' or 'downvote'",
                other
            ))),
        }
    }
}

/// Vote document (`votes/{userId}_{rantId}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: String,
    /// Rant ID
    pub content_id: String,
    #[serde(default = "default_vote_content_type")]
    pub content_type: String,
    pub vote_type: VoteType,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_vote_content_type() -> String {
    "rant".to_string()
}

impl Vote {
    pub fn new(user_id: &str, rant_id: &str, vote_type: VoteType, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            content_id: rant_id.to_string(),
            content_type: default_vote_content_type(),
            vote_type,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Removed,
    Updated,
}

/// What a vote request does to the vote document and the rant counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePlan {
    pub action: VoteAction,
    /// Vote held after the change (`None` when toggled off)
    pub vote_type: Option<VoteType>,
    /// Vote replaced by an `Updated` action
    pub previous_vote: Option<VoteType>,
    /// Counter increments to apply on the rant
    pub deltas: Vec<(RantStat, i64)>,
}

impl VotePlan {
    /// Plan the toggle for `requested` given the user's current vote.
    ///
    /// - no vote: create it, +1 on its counter
    /// - same vote: remove it, -1 on its counter
    /// - other vote: switch it, -1 on the old counter and +1 on the new one
    pub fn new(existing: Option<VoteType>, requested: VoteType) -> Self {
        match existing {
            None => Self {
                action: VoteAction::Created,
                vote_type: Some(requested),
                previous_vote: None,
                deltas: vec![(requested.counter(), 1)],
            },
            Some(current) if current == requested => Self {
                action: VoteAction::Removed,
                vote_type: None,
                previous_vote: None,
                deltas: vec![(requested.counter(), -1)],
            },
            Some(current) => Self {
                action: VoteAction::Updated,
                vote_type: Some(requested),
                previous_vote: Some(current),
                deltas: vec![(current.counter(), -1), (requested.counter(), 1)],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vote_type() {
        assert_eq!("upvote".parse::<VoteType>().unwrap(), VoteType::Upvote);
        assert_eq!("downvote".parse::<VoteType>().unwrap(), VoteType::Downvote);
        assert!(matches!(
            "sidevote".parse::<VoteType>(),
            Err(AppError::InvalidArgument(_))
        ));
        assert!("Upvote".parse::<VoteType>().is_err());
    }

    #[test]
    fn test_repeated_identical_votes_toggle() {
        let mut current = None;
        let mut actions = Vec::new();
        let mut upvotes = 0;

        for _ in 0..3 {
            let plan = VotePlan::new(current, VoteType::Upvote);
            for (stat, delta) in &plan.deltas {
                assert_eq!(*stat, RantStat::Upvotes);
                upvotes += delta;
            }
            actions.push(plan.action);
            current = plan.vote_type;
        }

        assert_eq!(
            actions,
            vec![VoteAction::Created, VoteAction::Removed, VoteAction::Created]
        );
        assert_eq!(current, Some(VoteType::Upvote));
        assert_eq!(upvotes, 1);
    }

    #[test]
    fn test_switching_vote_moves_counters() {
        let plan = VotePlan::new(Some(VoteType::Upvote), VoteType::Downvote);

        assert_eq!(plan.action, VoteAction::Updated);
        assert_eq!(plan.previous_vote, Some(VoteType::Upvote));
        assert_eq!(plan.vote_type, Some(VoteType::Downvote));
        assert_eq!(
            plan.deltas,
            vec![(RantStat::Upvotes, -1), (RantStat::Downvotes, 1)]
        );
    }

    #[test]
    fn test_removing_reports_no_vote() {
        let plan = VotePlan::new(Some(VoteType::Downvote), VoteType::Downvote);
        assert_eq!(plan.action, VoteAction::Removed);
        assert_eq!(plan.vote_type, None);
        assert_eq!(plan.deltas, vec![(RantStat::Downvotes, -1)]);
    }
}
