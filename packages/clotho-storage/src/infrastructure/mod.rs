//! Infrastructure layer - Storage adapters
//!
//! - `InMemoryDocumentStore`: tests and one-shot tooling
//! - `SqliteDocumentStore`: embedded persistent store

use std::sync::Arc;

use tracing::info;

use crate::config::{Backend, ConfigError, StoreConfig};
use crate::domain::DocumentStore;
use crate::error::Result;

pub mod memory_store;
pub use memory_store::InMemoryDocumentStore;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Acquire the store described by `config`
///
/// The returned handle is shared by every repository and resolver built
/// from it; call [`DocumentStore::close`] on shutdown.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    config.validate()?;

    match config.backend {
        Backend::Memory => {
            info!("document_store_connected backend=memory");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => {
            let settings = config.sqlite.as_ref().ok_or_else(|| ConfigError::MissingSection {
                backend: Backend::Sqlite.to_string(),
                section: "sqlite".to_string(),
            })?;
            Ok(Arc::new(SqliteDocumentStore::open(&settings.path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite => Err(ConfigError::UnknownBackend(
            "sqlite (built without the `sqlite` feature)".to_string(),
        )
        .into()),
    }
}
