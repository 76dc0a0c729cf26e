//! Typed repository over the document store
//!
//! One generic [`Repository`] replaces a per-type store: each document type
//! gets a thin instance (`Repository<Module>`, `Repository<VersionRecord>`, ...)
//! sharing the same store handle.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use super::models::{Application, Document, Format, Module, VersionRecord};
use super::object_id::ObjectId;
use super::ports::{DocumentStore, Filter};
use crate::error::{Result, StorageError};

/// Typed access to one collection
pub struct Repository<T: Document> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

pub type ModuleRepository = Repository<Module>;
pub type FormatRepository = Repository<Format>;
pub type ApplicationRepository = Repository<Application>;
pub type VersionRepository = Repository<VersionRecord>;

impl<T: Document> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Collection this repository reads and writes
    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Underlying store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Insert a document; returns it as stored
    pub async fn insert(&self, document: &T) -> Result<T> {
        let value = serde_json::to_value(document)?;
        let stored = self.store.insert(T::COLLECTION, value).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Documents matching `filter`, in insertion order
    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>> {
        self.store
            .find(T::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StorageError::from))
            .collect()
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<T>> {
        Ok(self.find(&Filter::by_id(id)).await?.into_iter().next())
    }

    /// Like [`find_by_id`](Self::find_by_id), failing with `NotFound`
    pub async fn get(&self, id: &ObjectId) -> Result<T> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found(T::COLLECTION, id))
    }

    /// Set one field of an existing document
    pub async fn update_field<V: Serialize>(
        &self,
        id: &ObjectId,
        field: &str,
        value: V,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let updated = self
            .store
            .update_field(T::COLLECTION, id, field, value)
            .await?;
        if !updated {
            return Err(StorageError::not_found(T::COLLECTION, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infrastructure::InMemoryDocumentStore;

    fn store() -> Arc<dyn DocumentStore> {
        Arc::new(InMemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let modules = ModuleRepository::new(store());
        let module = Module::new("pTet", ObjectId::new()).with_description("tet promoter");

        let stored = modules.insert(&module).await.unwrap();
        assert_eq!(stored, module);

        let found = modules.find_by_id(&module.id).await.unwrap();
        assert_eq!(found, Some(module));
        assert_eq!(modules.find_by_id(&ObjectId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_with_filter() {
        let formats = FormatRepository::new(store());
        let user = ObjectId::new();
        formats.insert(&Format::new("SBOL", user)).await.unwrap();
        formats.insert(&Format::new("GenBank", user)).await.unwrap();

        let sbol = formats
            .find(&Filter::new().where_eq("name", "SBOL"))
            .await
            .unwrap();
        assert_eq!(sbol.len(), 1);
        assert_eq!(sbol[0].name, "SBOL");

        let by_user = formats
            .find(&Filter::new().where_eq("createdBy", user))
            .await
            .unwrap();
        assert_eq!(by_user.len(), 2);
    }

    #[tokio::test]
    async fn test_repositories_share_store_but_not_collections() {
        let shared = store();
        let formats = FormatRepository::new(Arc::clone(&shared));
        let applications = ApplicationRepository::new(shared);

        let app = Application::new("Designer", ObjectId::new());
        applications.insert(&app).await.unwrap();

        assert!(formats.find(&Filter::new()).await.unwrap().is_empty());
        assert_eq!(applications.find(&Filter::new()).await.unwrap().len(), 1);
        assert_eq!(applications.collection(), "applications");
    }

    #[tokio::test]
    async fn test_update_field() {
        let modules = ModuleRepository::new(store());
        let module = modules
            .insert(&Module::new("pTet", ObjectId::new()))
            .await
            .unwrap();

        modules
            .update_field(&module.id, "description", "repressible promoter")
            .await
            .unwrap();

        let updated = modules.get(&module.id).await.unwrap();
        assert_eq!(updated.description, "repressible promoter");
        assert_eq!(updated.name, "pTet");
    }

    #[tokio::test]
    async fn test_update_missing_document_is_not_found() {
        let modules = ModuleRepository::new(store());
        let err = modules
            .update_field(&ObjectId::new(), "description", "x")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_missing_document_is_not_found() {
        let versions = VersionRepository::new(store());
        let err = versions.get(&ObjectId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(err.message.contains("versions"));
    }
}
