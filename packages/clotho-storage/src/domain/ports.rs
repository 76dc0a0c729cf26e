//! Storage Port (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Persistent: SQLite (embedded, zero-config)
//! - Testing & tooling: InMemory

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::object_id::ObjectId;
use crate::error::{Result, StorageError};

/// Identifier field of every stored document
pub const ID_FIELD: &str = "_id";

/// Document Store Port (Primary Interface)
///
/// Documents are JSON objects grouped in named collections. All storage
/// backends must implement this trait; typed access goes through
/// [`Repository`](super::repository::Repository).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection` matching `filter`, in insertion order
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Insert a new document
    ///
    /// Assigns a fresh `_id` when the document has none. Fails if the
    /// collection already holds a document with the same `_id`.
    /// Returns the stored document.
    async fn insert(&self, collection: &str, document: Value) -> Result<Value>;

    /// Set one top-level field of the document with the given `_id`
    ///
    /// Returns `false` when no such document exists.
    async fn update_field(
        &self,
        collection: &str,
        id: &ObjectId,
        field: &str,
        value: Value,
    ) -> Result<bool>;

    /// Document counts per collection
    async fn stats(&self) -> Result<StorageStats>;

    /// Release the underlying resources; later calls fail
    async fn close(&self) -> Result<()>;
}

/// Storage Statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Documents per collection
    pub collections: BTreeMap<String, usize>,

    /// Total number of documents
    pub total_documents: usize,
}

impl StorageStats {
    pub fn from_counts(collections: BTreeMap<String, usize>) -> Self {
        let total_documents = collections.values().sum();
        Self {
            collections,
            total_documents,
        }
    }
}

/// Conjunction of top-level field equalities
///
/// Equality is typed: `true` does not match `1`, and `2` does not match
/// `2.0`. A `null` value also matches documents that lack the field.
/// `_id` clauses compare against the canonical lowercase hex form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on `_id`
    pub fn by_id(id: &ObjectId) -> Self {
        Self::new().where_eq(ID_FIELD, *id)
    }

    /// Add an equality clause
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against a document (used by in-process backends)
    pub fn matches(&self, document: &Value) -> bool {
        let Some(object) = document.as_object() else {
            return false;
        };
        self.clauses
            .iter()
            .all(|(field, expected)| match object.get(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}

/// Field names a store accepts in filters and updates
pub fn validate_field_name(field: &str) -> Result<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_argument(format!(
            "Invalid field name: {:?}",
            field
        )))
    }
}

/// Collection names must be non-empty
pub fn validate_collection(collection: &str) -> Result<()> {
    if collection.trim().is_empty() {
        return Err(StorageError::invalid_argument(
            "Collection name must not be empty",
        ));
    }
    Ok(())
}

/// Ensure `document` is an object carrying an `_id`, assigning one if absent
///
/// The stored `_id` is rewritten to its canonical lowercase hex form.
/// Returns the document's identifier.
pub fn ensure_document_id(document: &mut Value) -> Result<ObjectId> {
    let object: &mut Map<String, Value> = document.as_object_mut().ok_or_else(|| {
        StorageError::invalid_argument("Documents must be JSON objects")
    })?;

    let id = match object.get(ID_FIELD) {
        Some(Value::String(raw)) => ObjectId::parse_str(raw)?,
        Some(other) => return Err(StorageError::invalid_identifier(other.to_string())),
        None => ObjectId::new(),
    };
    object.insert(ID_FIELD.to_string(), id.into());
    Ok(id)
}

/// Reject updates that would rewrite a document's identity
pub fn validate_update_field(field: &str) -> Result<()> {
    validate_field_name(field)?;
    if field == ID_FIELD {
        return Err(StorageError::invalid_argument("_id cannot be updated"));
    }
    Ok(())
}
