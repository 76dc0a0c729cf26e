//! clotho-storage: document storage and version chains for Clotho
//!
//! Design documents (modules, formats, applications) are stored as JSON
//! documents. Every revision of a document gets a `VersionRecord`; when a
//! newer revision supersedes an older one, the older record points at it
//! through `replacementVersionId`. Following those links yields the current
//! revision.
//!
//! ## Layers
//!
//! - `domain`: identifiers, models, the `DocumentStore` port, typed repositories
//! - `infrastructure`: in-memory and SQLite stores, `connect`
//! - `versioning`: chain resolution and version record writes
//! - `config`: YAML + environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clotho_storage::{connect, NewVersion, ObjectId, StoreConfig, VersionLedger};
//!
//! let config = StoreConfig::from_yaml("clotho.yaml")?.apply_env_overrides()?;
//! let store = connect(&config)?;
//! let ledger = VersionLedger::from_config(store.clone(), &config.resolver);
//!
//! // 1. First revision
//! let (v1, user) = (ObjectId::new(), ObjectId::new());
//! ledger.record_revision(None, NewVersion::new(v1, user, "modules")).await?;
//!
//! // 2. Second revision supersedes the first
//! let v2 = ObjectId::new();
//! ledger.record_revision(Some(v1), NewVersion::new(v2, user, "modules")).await?;
//!
//! // 3. Resolve from any point of the chain
//! let newest = ledger.resolver().find_newest(&v1.to_hex(), "modules").await?;
//! assert_eq!(newest.subject_id, v2);
//! assert_eq!(newest.version_number, Some(2));
//!
//! store.close().await?;
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod versioning;

pub use error::{ErrorKind, Result, StorageError};

pub use config::{Backend, StoreConfig};
pub use domain::{Document, DocumentStore, Filter, ObjectId, Repository, VersionRecord};
pub use infrastructure::{connect, InMemoryDocumentStore};
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteDocumentStore;
pub use versioning::{NewVersion, NewestVersion, VersionChainResolver, VersionLedger};
