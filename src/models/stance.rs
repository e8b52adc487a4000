// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Stance model and per-rant aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::AppError;

/// A user's position on a rant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StanceValue {
    Favor,
    Against,
}

impl FromStr for StanceValue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favor" => Ok(StanceValue::Favor),
            "against" => Ok(StanceValue::Against),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid stance '{}'. Must be 'favor' or 'against'",
                other
            ))),
        }
    }
}

/// Stance document (`user_stances/{userId}_{rantId}`). Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stance {
    pub user_id: String,
    pub rant_id: String,
    pub stance: StanceValue,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Favor/against split for one rant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StanceStats {
    pub total: u32,
    pub favor: u32,
    pub against: u32,
    /// Whole percent, rounded half up
    pub favor_percentage: u32,
    pub against_percentage: u32,
}

impl StanceStats {
    pub fn from_stances(stances: &[Stance]) -> Self {
        let favor = stances
            .iter()
            .filter(|s| s.stance == StanceValue::Favor)
            .count() as u32;
        let against = stances
            .iter()
            .filter(|s| s.stance == StanceValue::Against)
            .count() as u32;
        let total = stances.len() as u32;

        Self {
            total,
            favor,
            against,
            favor_percentage: percentage(favor, total),
            against_percentage: percentage(against, total),
        }
    }
}

fn percentage(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}
