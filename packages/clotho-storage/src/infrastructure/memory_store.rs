//! In-Memory Document Store
//!
//! HashMap-of-vectors implementation for tests and one-shot tooling.
//! Nothing survives the process.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::ports::{
    ensure_document_id, validate_collection, validate_field_name, validate_update_field,
    DocumentStore, Filter, StorageStats, ID_FIELD,
};
use crate::domain::ObjectId;
use crate::error::{Result, StorageError};

#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::store_query("In-memory store is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        self.ensure_open()?;
        validate_collection(collection)?;
        for (field, _) in filter.clauses() {
            validate_field_name(field)?;
        }

        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, mut document: Value) -> Result<Value> {
        self.ensure_open()?;
        validate_collection(collection)?;
        let id = ensure_document_id(&mut document)?;
        let id_value = Value::from(id);

        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.get(ID_FIELD) == Some(&id_value)) {
            return Err(StorageError::store_query(format!(
                "Duplicate _id {} in collection '{}'",
                id, collection
            )));
        }
        docs.push(document.clone());
        Ok(document)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &ObjectId,
        field: &str,
        value: Value,
    ) -> Result<bool> {
        self.ensure_open()?;
        validate_collection(collection)?;
        validate_update_field(field)?;
        let id_value = Value::from(*id);

        let mut collections = self.collections.write();
        let target = collections.get_mut(collection).and_then(|docs| {
            docs.iter_mut()
                .find(|d| d.get(ID_FIELD) == Some(&id_value))
        });

        match target.and_then(Value::as_object_mut) {
            Some(object) => {
                object.insert(field.to_string(), value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn stats(&self) -> Result<StorageStats> {
        self.ensure_open()?;
        let collections = self.collections.read();
        let counts: BTreeMap<String, usize> = collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect();
        Ok(StorageStats::from_counts(counts))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.collections.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = InMemoryDocumentStore::new();
        let stored = store.insert("modules", json!({"name": "pTet"})).await.unwrap();

        let raw = stored["_id"].as_str().unwrap();
        assert!(ObjectId::parse_str(raw).is_ok());
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let store = InMemoryDocumentStore::new();
        for n in 1..=3 {
            store
                .insert("versions", json!({"subject": "s", "versionNumber": n}))
                .await
                .unwrap();
        }

        let found = store
            .find("versions", &Filter::new().where_eq("subject", "s"))
            .await
            .unwrap();
        let numbers: Vec<i64> = found
            .iter()
            .map(|d| d["versionNumber"].as_i64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = InMemoryDocumentStore::new();
        let id = ObjectId::new();
        store.insert("modules", json!({"_id": id.to_hex()})).await.unwrap();

        let err = store
            .insert("modules", json!({"_id": id.to_hex()}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StoreQuery);

        // Same id in another collection is fine
        store.insert("formats", json!({"_id": id.to_hex()})).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_field() {
        let store = InMemoryDocumentStore::new();
        let stored = store.insert("versions", json!({"n": 1})).await.unwrap();
        let id = ObjectId::parse_str(stored["_id"].as_str().unwrap()).unwrap();

        assert!(store
            .update_field("versions", &id, "replacementVersionId", json!("abc"))
            .await
            .unwrap());
        assert!(!store
            .update_field("versions", &ObjectId::new(), "n", json!(2))
            .await
            .unwrap());

        let found = store.find("versions", &Filter::by_id(&id)).await.unwrap();
        assert_eq!(found[0]["replacementVersionId"], "abc");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        assert!(store.find("nothing", &Filter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = InMemoryDocumentStore::new();
        store.insert("modules", json!({})).await.unwrap();
        store.insert("modules", json!({})).await.unwrap();
        store.insert("versions", json!({})).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.collections["modules"], 2);
        assert_eq!(stats.collections["versions"], 1);
        assert_eq!(stats.total_documents, 3);
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = InMemoryDocumentStore::new();
        store.insert("modules", json!({})).await.unwrap();
        store.close().await.unwrap();

        let err = store.find("modules", &Filter::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::StoreQuery);
        assert!(store.insert("modules", json!({})).await.is_err());
    }
}
