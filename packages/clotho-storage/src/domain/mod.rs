//! Domain layer
//!
//! # Domain Models
//!
//! - `ObjectId`: store-native 12-byte identifier (24 hex characters)
//! - `VersionRecord`: one revision in a replaced-by chain
//! - `Module`, `Format`, `Application`: design documents
//!
//! # Port Trait
//!
//! - `DocumentStore`: JSON document storage abstraction (`find` / `insert` /
//!   `update_field`)
//! - `Repository<T>`: typed access to one collection
//!
//! # Examples
//!
//! ```rust,ignore
//! use clotho_storage::domain::{Filter, Module, ModuleRepository, ObjectId};
//!
//! async fn example(store: Arc<dyn DocumentStore>) -> Result<()> {
//!     let modules = ModuleRepository::new(store);
//!
//!     let module = Module::new("pTet", ObjectId::new());
//!     modules.insert(&module).await?;
//!
//!     let named = modules.find(&Filter::new().where_eq("name", "pTet")).await?;
//!     assert_eq!(named.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod models;
pub mod object_id;
pub mod ports;
pub mod repository;

pub use models::{Application, Document, Format, Module, VersionRecord};
pub use object_id::ObjectId;
pub use ports::{DocumentStore, Filter, StorageStats, ID_FIELD};
pub use repository::{
    ApplicationRepository, FormatRepository, ModuleRepository, Repository, VersionRepository,
};
