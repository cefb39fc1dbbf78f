// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used for offline mode and tests. Writes can be made to fail per
//! collection (or entirely) to exercise the remote-failure paths, and
//! individual bearer tokens can be revoked to produce `401`s. Reads of a
//! collection can be restricted to callers with a token, the way deployed
//! security rules gate the member directory.

use crate::db::value::{Document, Fields};
use crate::db::DocumentStore;
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory document store keyed by `collection/id`.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, Fields>,
    failing_writes: DashSet<String>,
    restricted_reads: DashSet<String>,
    revoked_tokens: DashSet<String>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }

    /// Seed or overwrite a document directly (no write counted).
    pub fn insert(&self, collection: &str, id: &str, fields: Fields) {
        self.documents.insert(Self::key(collection, id), fields);
    }

    /// Raw stored fields of a document.
    pub fn raw(&self, collection: &str, id: &str) -> Option<Fields> {
        self.documents
            .get(&Self::key(collection, id))
            .map(|entry| entry.value().clone())
    }

    /// Make every write to `collection` fail until cleared.
    pub fn fail_writes_to(&self, collection: &str) {
        self.failing_writes.insert(collection.to_string());
    }

    /// Refuse anonymous reads of `collection` with `403`.
    pub fn restrict_reads(&self, collection: &str) {
        self.restricted_reads.insert(collection.to_string());
    }

    /// Reject requests carrying this bearer token with `401`.
    pub fn revoke_token(&self, token: &str) {
        self.revoked_tokens.insert(token.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_writes.clear();
        self.offline.store(false, Ordering::SeqCst);
    }

    /// Simulate an unreachable backend (reads and writes fail).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of write calls attempted (successful or not).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database("backend unreachable".to_string()));
        }
        Ok(())
    }

    fn check_token(&self, token: Option<&str>) -> Result<(), AppError> {
        if token.is_some_and(|t| self.revoked_tokens.contains(t)) {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }

    fn check_read(&self, collection: &str, token: Option<&str>) -> Result<(), AppError> {
        self.check_reachable()?;
        self.check_token(token)?;
        if token.is_none() && self.restricted_reads.contains(collection) {
            return Err(AppError::Forbidden(format!(
                "reads of {} require a signed-in caller",
                collection
            )));
        }
        Ok(())
    }

    fn check_write(&self, collection: &str, token: Option<&str>) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        self.check_token(token)?;
        if self.failing_writes.contains(collection) {
            return Err(AppError::Database(format!(
                "simulated write failure for {}",
                collection
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(
        &self,
        collection: &str,
        token: Option<&str>,
    ) -> Result<Vec<Document>, AppError> {
        self.check_read(collection, token)?;
        let prefix = format!("{}/", collection);
        let mut documents: Vec<Document> = self
            .documents
            .iter()
            .filter(|entry| {
                entry
                    .key()
                    .strip_prefix(&prefix)
                    .is_some_and(|id| !id.contains('/'))
            })
            .map(|entry| Document::new(entry.key().clone(), entry.value().clone()))
            .collect();
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<Document>, AppError> {
        self.check_read(collection, token)?;
        let key = Self::key(collection, id);
        Ok(self
            .documents
            .get(&key)
            .map(|entry| Document::new(key.clone(), entry.value().clone())))
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        self.check_write(collection, token)?;
        let key = Self::key(collection, id);
        if self.documents.contains_key(&key) {
            return Err(AppError::Database(format!(
                "ALREADY_EXISTS: document {} already exists",
                key
            )));
        }
        self.documents.insert(key, fields.clone());
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        self.check_write(collection, token)?;
        self.documents
            .insert(Self::key(collection, id), fields.clone());
        Ok(())
    }

    async fn delete(
        &self,
        collection: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        self.check_write(collection, token)?;
        self.documents.remove(&Self::key(collection, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::value::FieldsBuilder;

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let store = MemoryStore::new();
        let fields = FieldsBuilder::new().string("title", "a").build();

        store.create("news", "1", &fields, None).await.unwrap();
        assert!(store.create("news", "1", &fields, None).await.is_err());
        assert_eq!(store.list("news", None).await.unwrap().len(), 1);
        assert!(store.list("events", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        let fields = Fields::new();

        store.fail_writes_to("polls");
        assert!(store.update("polls", "1", &fields, None).await.is_err());
        assert!(store.update("news", "1", &fields, None).await.is_ok());

        store.set_offline(true);
        assert!(store.list("news", None).await.is_err());

        store.clear_failures();
        assert!(store.update("polls", "1", &fields, None).await.is_ok());
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_restricted_reads_need_a_token() {
        let store = MemoryStore::new();
        store.insert("users", "kim01", FieldsBuilder::new().string("name", "Kim").build());
        store.restrict_reads("users");

        assert!(matches!(
            store.list("users", None).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            store.get("users", "kim01", None).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(store.list("users", Some("token-a")).await.unwrap().len(), 1);
        assert!(store.get("users", "kim01", Some("token-a")).await.unwrap().is_some());

        store.revoke_token("token-a");
        assert!(matches!(
            store.list("users", Some("token-a")).await,
            Err(AppError::Unauthorized)
        ));
        // other collections stay public
        assert!(store.list("news", None).await.unwrap().is_empty());
    }
}
