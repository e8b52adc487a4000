// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper.
//!
//! Typed per-collection operations live in the sibling modules
//! (`users`, `rants`, `comments`, `votes`, `bookmarks`, `stances`), all as
//! `impl FirestoreDb` blocks. This module owns the connection and the
//! generic document helpers they share.

use crate::error::AppError;
use firestore::errors::FirestoreError;
use firestore::FirestoreTransaction;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// A server-side increment on one numeric field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterChange {
    pub collection: &'static str,
    pub document_id: String,
    pub field: &'static str,
    pub delta: i64,
}

impl CounterChange {
    pub fn new(
        collection: &'static str,
        document_id: impl Into<String>,
        field: &'static str,
        delta: i64,
    ) -> Self {
        Self {
            collection,
            document_id: document_id.into(),
            field,
            delta,
        }
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // The emulator accepts any bearer token.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    pub(crate) fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic document helpers ────────────────────────────────

    /// Read one document by ID.
    pub(crate) async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a document exists, without caring about its shape.
    pub(crate) async fn doc_exists(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let doc = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(doc.is_some())
    }

    /// Create or replace a document.
    pub(crate) async fn upsert_doc<T>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(value)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a document only if the ID is free.
    ///
    /// Returns `false` when a document with this ID already exists.
    pub(crate) async fn create_doc_if_absent<T>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let result: Result<(), FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(value)
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Overwrite only the named fields of an existing document.
    pub(crate) async fn update_fields<T>(
        &self,
        collection: &str,
        id: &str,
        fields: &[&str],
        patch: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields.iter().copied())
            .in_col(collection)
            .document_id(id)
            .object(patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub(crate) async fn delete_doc(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Transactions ────────────────────────────────────────────

    pub(crate) async fn begin_transaction(&self) -> Result<FirestoreTransaction<'_>, AppError> {
        self.get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }

    pub(crate) async fn commit_transaction(
        &self,
        transaction: FirestoreTransaction<'_>,
    ) -> Result<(), AppError> {
        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;
        Ok(())
    }

    /// Add server-side increments to an open transaction.
    ///
    /// Changes targeting the same document are sent as one write.
    pub(crate) fn add_increments(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        changes: &[CounterChange],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        for (collection, document_id, fields) in group_by_document(changes) {
            client
                .fluent()
                .update()
                .in_col(collection)
                .document_id(&document_id)
                .transforms(|t| {
                    t.fields(
                        fields
                            .iter()
                            .map(|(field, delta)| t.field(*field).increment(*delta)),
                    )
                })
                .only_transform()
                .add_to_transaction(transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add increment on {}/{} to transaction: {}",
                        collection, document_id, e
                    ))
                })?;
        }

        Ok(())
    }

    /// Apply counter increments atomically in their own transaction.
    pub async fn apply_increments(&self, changes: &[CounterChange]) -> Result<(), AppError> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut transaction = self.begin_transaction().await?;
        self.add_increments(&mut transaction, changes)?;
        self.commit_transaction(transaction).await
    }
}

/// Group increments per target document, keeping first-seen order.
fn group_by_document(
    changes: &[CounterChange],
) -> Vec<(&'static str, String, Vec<(&'static str, i64)>)> {
    let mut grouped: Vec<(&'static str, String, Vec<(&'static str, i64)>)> = Vec::new();

    for change in changes.iter().filter(|c| c.delta != 0) {
        match grouped
            .iter_mut()
            .find(|(col, id, _)| *col == change.collection && *id == change.document_id)
        {
            Some((_, _, fields)) => match fields.iter_mut().find(|(f, _)| *f == change.field) {
                Some((_, delta)) => *delta += change.delta,
                None => fields.push((change.field, change.delta)),
            },
            None => grouped.push((
                change.collection,
                change.document_id.clone(),
                vec![(change.field, change.delta)],
            )),
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_document_merges_and_drops_zero() {
        let changes = vec![
            CounterChange::new("rants", "r1", "upvotes", -1),
            CounterChange::new("rants", "r1", "downvotes", 1),
            CounterChange::new("users", "u1", "commentsCount", 1),
            CounterChange::new("rants", "r1", "upvotes", 2),
            CounterChange::new("rants", "r2", "viewsCount", 0),
        ];

        let grouped = group_by_document(&changes);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "rants");
        assert_eq!(grouped[0].1, "r1");
        assert_eq!(grouped[0].2, vec![("upvotes", 1), ("downvotes", 1)]);
        assert_eq!(grouped[1].2, vec![("commentsCount", 1)]);
    }

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let err = db.get_doc::<serde_json::Value>("rants", "x").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(db.apply_increments(&[]).await.is_ok());
    }
}
