// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed remote access layer.
//!
//! Wraps a [`DocumentStore`] with entity-level operations that never fail
//! for ordinary remote problems:
//! - list reads return `None` when the backend could not be reached (the
//!   caller keeps its current state) and `Some(vec![])` for an empty collection
//! - writes return `true` iff the backend reported success
//!
//! Reads and writes take the caller's bearer token (`None` for anonymous
//! visitors) so security rules can gate them.
//!
//! Transport and status errors are logged here and folded away. The only
//! exception is `401`, which the store uses to refresh its token; see
//! [`RemoteData::write_checked`].

use crate::db::value::{Document, Fields};
use crate::db::{collections, DocumentStore, SITE_CONTENT_ID};
use crate::error::{AppError, DecodeError};
use crate::models::{DeletionMarker, SiteContent, User};
use std::sync::Arc;

/// Schema of a record stored as one document.
pub trait FirestoreRecord: Sized {
    const COLLECTION: &'static str;
    /// Human-readable kind, used in notifications ("News article failed to save").
    const KIND: &'static str;

    fn document_id(&self) -> String;
    fn to_fields(&self) -> Fields;
    fn from_document(doc: &Document) -> Result<Self, DecodeError>;
}

/// Document id as a string; rejects nameless documents.
pub fn string_id(doc: &Document) -> Result<String, DecodeError> {
    doc.id().map(str::to_string).ok_or(DecodeError::MissingName)
}

/// Document id parsed as a numeric record id.
pub fn numeric_id(doc: &Document, kind: &'static str) -> Result<i64, DecodeError> {
    let id = doc.id().ok_or(DecodeError::MissingName)?;
    id.parse().map_err(|_| DecodeError::InvalidId {
        kind,
        id: id.to_string(),
    })
}

/// Typed access to the remote document store.
#[derive(Clone)]
pub struct RemoteData {
    store: Arc<dyn DocumentStore>,
}

impl RemoteData {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ─── Generic Record Operations ──────────────────────────────

    /// Fetch every record of a collection.
    ///
    /// Documents that fail to decode are skipped with a warning.
    pub async fn fetch_list<T: FirestoreRecord>(&self, token: Option<&str>) -> Option<Vec<T>> {
        let documents = match self.store.list(T::COLLECTION, token).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(collection = T::COLLECTION, error = %e, "Failed to fetch collection");
                return None;
            }
        };

        let records = documents
            .iter()
            .filter_map(|doc| match T::from_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection = T::COLLECTION,
                        document = %doc.name,
                        error = %e,
                        "Skipping undecodable document"
                    );
                    None
                }
            })
            .collect();
        Some(records)
    }

    /// Fetch one record; `None` when absent, undecodable or unreachable.
    pub async fn fetch_one<T: FirestoreRecord>(&self, id: &str, token: Option<&str>) -> Option<T> {
        match self.store.get(T::COLLECTION, id, token).await {
            Ok(Some(doc)) => match T::from_document(&doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(collection = T::COLLECTION, id, error = %e, "Undecodable document");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(collection = T::COLLECTION, id, error = %e, "Failed to fetch document");
                None
            }
        }
    }

    pub async fn create<T: FirestoreRecord>(&self, record: &T, token: Option<&str>) -> bool {
        self.write(&Write::Create(record), token).await
    }

    pub async fn update<T: FirestoreRecord>(&self, record: &T, token: Option<&str>) -> bool {
        self.write(&Write::Update(record), token).await
    }

    pub async fn delete<T: FirestoreRecord>(&self, id: &str, token: Option<&str>) -> bool {
        self.write(&Write::<T>::Delete(id), token).await
    }

    /// Perform a write, folding any failure into `false`.
    pub async fn write<T: FirestoreRecord>(&self, write: &Write<'_, T>, token: Option<&str>) -> bool {
        match self.write_checked(write, token).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    op = write.op_name(),
                    error = %e,
                    "Remote write failed"
                );
                false
            }
        }
    }

    /// Perform a write, keeping the error so the caller can react to `401`.
    pub async fn write_checked<T: FirestoreRecord>(
        &self,
        write: &Write<'_, T>,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        match write {
            Write::Create(record) => {
                self.store
                    .create(T::COLLECTION, &record.document_id(), &record.to_fields(), token)
                    .await
            }
            Write::Update(record) => {
                self.store
                    .update(T::COLLECTION, &record.document_id(), &record.to_fields(), token)
                    .await
            }
            Write::Delete(id) => self.store.delete(T::COLLECTION, id, token).await,
        }
    }

    // ─── Users ──────────────────────────────────────────────────

    pub async fn fetch_user(&self, user_id: &str, token: Option<&str>) -> Option<User> {
        self.fetch_one::<User>(user_id, token).await
    }

    // ─── Deletion Markers ───────────────────────────────────────

    /// Whether an admin marked this user deleted.
    ///
    /// `None` when the marker could not be read; that is never evidence either way.
    pub async fn is_marked_deleted(&self, user_id: &str, token: Option<&str>) -> Option<bool> {
        match self.store.get(collections::DELETED_USERS, user_id, token).await {
            Ok(doc) => Some(doc.is_some()),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to read deletion marker");
                None
            }
        }
    }

    pub async fn mark_deleted(&self, marker: &DeletionMarker, token: Option<&str>) -> bool {
        self.update(marker, token).await
    }

    pub async fn clear_deletion_marker(&self, user_id: &str, token: Option<&str>) -> bool {
        self.delete::<DeletionMarker>(user_id, token).await
    }

    // ─── Site Content ───────────────────────────────────────────

    /// Site content singleton. `Some(default)` if it was never written.
    pub async fn fetch_site_content(&self, token: Option<&str>) -> Option<SiteContent> {
        match self.store.get(collections::SETTINGS, SITE_CONTENT_ID, token).await {
            Ok(Some(doc)) => SiteContent::from_document(&doc).ok(),
            Ok(None) => Some(SiteContent::default()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch site content");
                None
            }
        }
    }
}

/// A single write against a record's collection.
pub enum Write<'a, T> {
    Create(&'a T),
    Update(&'a T),
    Delete(&'a str),
}

impl<T> Write<'_, T> {
    pub fn op_name(&self) -> &'static str {
        match self {
            Write::Create(_) => "create",
            Write::Update(_) => "update",
            Write::Delete(_) => "delete",
        }
    }
}
