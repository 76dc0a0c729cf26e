//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clotho_storage::domain::{StorageStats, VersionRepository};
use clotho_storage::{
    DocumentStore, Filter, InMemoryDocumentStore, ObjectId, Result, StorageError, VersionRecord,
};
use serde_json::Value;

/// Both backends, each freshly created
pub fn backends() -> Vec<(&'static str, Arc<dyn DocumentStore>)> {
    let mut stores: Vec<(&'static str, Arc<dyn DocumentStore>)> =
        vec![("memory", Arc::new(InMemoryDocumentStore::new()))];
    #[cfg(feature = "sqlite")]
    stores.push((
        "sqlite",
        Arc::new(clotho_storage::SqliteDocumentStore::in_memory().unwrap()),
    ));
    stores
}

pub fn record(
    subject: ObjectId,
    number: u32,
    collection: &str,
    replacement: Option<ObjectId>,
) -> VersionRecord {
    VersionRecord {
        id: ObjectId::new(),
        subject_id: subject,
        created_by: ObjectId::new(),
        version_number: number,
        collection_name: collection.to_string(),
        replacement_version_id: replacement,
        created_at: Utc::now(),
        description: String::new(),
        application: String::new(),
    }
}

/// Linear chain `ids[0] -> ids[1] -> ...`, numbered from 1
pub fn linear_chain(ids: &[ObjectId], collection: &str) -> Vec<VersionRecord> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| record(*id, i as u32 + 1, collection, ids.get(i + 1).copied()))
        .collect()
}

pub async fn seed(store: &Arc<dyn DocumentStore>, records: &[VersionRecord]) {
    let repo = VersionRepository::new(Arc::clone(store));
    for r in records {
        repo.insert(r).await.unwrap();
    }
}

/// Counts `find` calls against the wrapped store
pub struct CountingStore {
    inner: Arc<dyn DocumentStore>,
    finds: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
        }
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.finds.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(collection, filter).await
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<Value> {
        self.inner.insert(collection, document).await
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &ObjectId,
        field: &str,
        value: Value,
    ) -> Result<bool> {
        self.inner.update_field(collection, id, field, value).await
    }

    async fn stats(&self) -> Result<StorageStats> {
        self.inner.stats().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

/// Store whose every operation fails
pub struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _collection: &str, _filter: &Filter) -> Result<Vec<Value>> {
        Err(StorageError::store_query("connection reset"))
    }

    async fn insert(&self, _collection: &str, _document: Value) -> Result<Value> {
        Err(StorageError::store_query("connection reset"))
    }

    async fn update_field(
        &self,
        _collection: &str,
        _id: &ObjectId,
        _field: &str,
        _value: Value,
    ) -> Result<bool> {
        Err(StorageError::store_query("connection reset"))
    }

    async fn stats(&self) -> Result<StorageStats> {
        Err(StorageError::store_query("connection reset"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
