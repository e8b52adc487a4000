// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stance store: one immutable favor/against position per user and rant.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Stance, StanceStats, StanceValue};
use chrono::Utc;

#[derive(Clone)]
pub struct StanceService {
    db: FirestoreDb,
}

impl StanceService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    pub async fn get_user_stance(
        &self,
        user_id: &str,
        rant_id: &str,
    ) -> Result<Option<Stance>, AppError> {
        self.db.get_stance(user_id, rant_id).await
    }

    /// Record a stance. Fails with `AlreadySet` if the user already took one,
    /// including when a concurrent request wins the create.
    pub async fn set_user_stance(
        &self,
        user_id: &str,
        rant_id: &str,
        stance: &str,
    ) -> Result<Stance, AppError> {
        let value: StanceValue = stance.parse()?;

        if self.db.get_stance(user_id, rant_id).await?.is_some() {
            return Err(already_set());
        }

        let now = Utc::now();
        let stance = Stance {
            user_id: user_id.to_string(),
            rant_id: rant_id.to_string(),
            stance: value,
            created_at: Some(now),
            updated_at: Some(now),
        };

        if !self.db.create_stance(&stance).await? {
            tracing::warn!(user_id = %user_id, rant_id = %rant_id, "Concurrent stance submit rejected");
            return Err(already_set());
        }

        tracing::info!(user_id = %user_id, rant_id = %rant_id, stance = ?value, "Stance recorded");
        Ok(stance)
    }

    pub async fn get_rant_stances(&self, rant_id: &str) -> Result<Vec<Stance>, AppError> {
        self.db.list_stances_for_rant(rant_id).await
    }

    /// Favor/against split, from a full scan of the rant's stances.
    pub async fn get_rant_stance_stats(&self, rant_id: &str) -> Result<StanceStats, AppError> {
        let stances = self.get_rant_stances(rant_id).await?;
        Ok(StanceStats::from_stances(&stances))
    }
}

fn already_set() -> AppError {
    AppError::AlreadySet("User has already set a stance for this rant".to_string())
}
