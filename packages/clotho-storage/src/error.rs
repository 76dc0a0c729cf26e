//! Error types for clotho-storage

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backing store lookup, insert or update failed
    StoreQuery,
    /// Serialization/deserialization errors
    Serialization,
    /// Malformed external identifier
    InvalidIdentifier,
    /// Rejected caller input (empty collection name, `_id` update, ...)
    InvalidArgument,
    /// Document not found
    NotFound,
    /// Version chain revisited an identifier
    CycleDetected,
    /// Version chain walk exceeded the hop budget
    ChainTooLong,
    /// Version record already has a replacement link
    AlreadySuperseded,
    /// Configuration errors
    Config,
    /// I/O errors
    IO,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::StoreQuery => "store_query",
            ErrorKind::Serialization => "serialization",
            ErrorKind::InvalidIdentifier => "invalid_identifier",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CycleDetected => "cycle_detected",
            ErrorKind::ChainTooLong => "chain_too_long",
            ErrorKind::AlreadySuperseded => "already_superseded",
            ErrorKind::Config => "config",
            ErrorKind::IO => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn store_query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreQuery, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn invalid_identifier(raw: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidIdentifier,
            format!("Invalid identifier: {:?}", raw.into()),
        )
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn not_found(collection: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("No document {} in collection '{}'", id, collection),
        )
    }

    pub fn cycle_detected(collection: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::CycleDetected,
            format!(
                "Version chain in '{}' revisits subject {}",
                collection, id
            ),
        )
    }

    pub fn chain_too_long(collection: &str, start: impl fmt::Display, max_hops: usize) -> Self {
        Self::new(
            ErrorKind::ChainTooLong,
            format!(
                "Version chain in '{}' starting at {} exceeds {} hops",
                collection, start, max_hops
            ),
        )
    }

    pub fn already_superseded(id: impl fmt::Display, replacement: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::AlreadySuperseded,
            format!("Version {} is already replaced by {}", id, replacement),
        )
    }

    /// True for failures of the backing store itself
    pub fn is_store_failure(&self) -> bool {
        self.kind == ErrorKind::StoreQuery
    }
}

// SQLite error conversions
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::store_query(format!("SQLite error: {}", err)).with_source(err)
    }
}

// JSON error conversions
impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::new(ErrorKind::IO, format!("IO error: {}", err)).with_source(err)
    }
}

impl From<ConfigError> for StorageError {
    fn from(err: ConfigError) -> Self {
        StorageError::new(ErrorKind::Config, err.to_string()).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    // ═══════════════════════════════════════════════════════════════════════
    // Error Construction Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_store_query_error() {
        let err = StorageError::store_query("Connection refused");
        assert_eq!(err.kind, ErrorKind::StoreQuery);
        assert_eq!(err.message, "Connection refused");
        assert!(err.source.is_none());
        assert!(err.is_store_failure());

        assert_eq!(err.to_string(), "[store_query] Connection refused");
    }

    #[test]
    fn test_invalid_identifier() {
        let err = StorageError::invalid_identifier("not-an-id");
        assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
        assert!(err.message.contains("not-an-id"));
        assert!(!err.is_store_failure());
    }

    #[test]
    fn test_not_found_mentions_collection() {
        let err = StorageError::not_found("modules", "abc");
        assert_eq!(err.kind, ErrorKind::NotFound);

        let msg = err.to_string();
        assert!(msg.contains("[not_found]"));
        assert!(msg.contains("modules"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_chain_errors() {
        let cycle = StorageError::cycle_detected("things", "a1");
        assert_eq!(cycle.kind, ErrorKind::CycleDetected);
        assert!(cycle.message.contains("a1"));

        let long = StorageError::chain_too_long("things", "a1", 8);
        assert_eq!(long.kind, ErrorKind::ChainTooLong);
        assert!(long.message.contains("8 hops"));

        let linked = StorageError::already_superseded("a1", "b2");
        assert_eq!(linked.kind, ErrorKind::AlreadySuperseded);
        assert!(linked.message.contains("b2"));
    }

    #[test]
    fn test_with_source() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StorageError::store_query("DB file missing").with_source(io_err);

        assert_eq!(err.kind, ErrorKind::StoreQuery);
        let source = err.source().unwrap();
        assert!(source.to_string().contains("file not found"));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ErrorKind Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_error_kind_as_str() {
        assert_eq!(ErrorKind::StoreQuery.as_str(), "store_query");
        assert_eq!(ErrorKind::Serialization.as_str(), "serialization");
        assert_eq!(ErrorKind::InvalidIdentifier.as_str(), "invalid_identifier");
        assert_eq!(ErrorKind::InvalidArgument.as_str(), "invalid_argument");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::CycleDetected.as_str(), "cycle_detected");
        assert_eq!(ErrorKind::ChainTooLong.as_str(), "chain_too_long");
        assert_eq!(ErrorKind::AlreadySuperseded.as_str(), "already_superseded");
        assert_eq!(ErrorKind::Config.as_str(), "config");
        assert_eq!(ErrorKind::IO.as_str(), "io");
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Conversion Tests
    // ═══════════════════════════════════════════════════════════════════════

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_from_rusqlite_error() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(err.kind, ErrorKind::StoreQuery);
        assert!(err.message.contains("SQLite error"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json")
            .err()
            .unwrap();
        let err: StorageError = json_err.into();

        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(err.message.contains("JSON error"));
        assert!(err.source.is_some());
    }

    #[test]
    fn test_from_config_error() {
        let err: StorageError = ConfigError::MissingVersion.into();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("version"));
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(StorageError::cycle_detected("things", "x"))
        }

        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }

        let err = outer().unwrap_err();
        assert_eq!(err.kind, ErrorKind::CycleDetected);
    }
}
