//! Stance document operations.

use super::collections;
use super::FirestoreDb;
use crate::error::AppError;
use crate::models::{composite_id, Stance};

impl FirestoreDb {
    pub async fn get_stance(&self, user_id: &str, rant_id: &str) -> Result<Option<Stance>, AppError> {
        self.get_doc(collections::USER_STANCES, &composite_id(user_id, rant_id))
            .await
    }

    /// Create a stance unless one already exists for the pair.
    ///
    /// Returns `false` if a stance was already recorded.
    pub async fn create_stance(&self, stance: &Stance) -> Result<bool, AppError> {
        self.create_doc_if_absent(
            collections::USER_STANCES,
            &composite_id(&stance.user_id, &stance.rant_id),
            stance,
        )
        .await
    }

    /// Every stance recorded on a rant.
    pub async fn list_stances_for_rant(&self, rant_id: &str) -> Result<Vec<Stance>, AppError> {
        let rant_id = rant_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_STANCES)
            .filter(move |q| q.field("rantId").eq(rant_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
