//! Version chain resolution
//!
//! A chain is the set of [`VersionRecord`]s of one collection linked through
//! `replacementVersionId`. Resolving walks the links forward, one store
//! lookup per hop, until it reaches a record without a replacement or a
//! subject without records.
//!
//! ```text
//! A (v1) ──replaced by──▶ B (v2) ──replaced by──▶ C (v3, terminal)
//!
//! find_newest(A) = (C, 3)     lookups: A, B, C
//! find_newest(D) = (D, -)     D has no records
//! ```
//!
//! The walk keeps a visited set and a hop budget, so a corrupted chain
//! (cycle, runaway length) surfaces as an error instead of looping.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::domain::ports::validate_collection;
use crate::domain::{DocumentStore, Filter, ObjectId, VersionRecord, VersionRepository};
use crate::error::{Result, StorageError};

/// Outcome of [`VersionChainResolver::find_newest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewestVersion {
    /// Subject at the end of the chain
    pub subject_id: ObjectId,
    /// Version number of the terminal record; `None` when the walk ended at a
    /// subject with no version history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_number: Option<u32>,
}

impl NewestVersion {
    pub fn unversioned(subject_id: ObjectId) -> Self {
        Self {
            subject_id,
            version_number: None,
        }
    }

    pub fn versioned(subject_id: ObjectId, version_number: u32) -> Self {
        Self {
            subject_id,
            version_number: Some(version_number),
        }
    }
}

/// Records visited by one walk
#[derive(Debug)]
struct ChainWalk {
    records: Vec<VersionRecord>,
    end: ObjectId,
}

/// Resolves the current revision of a subject
#[derive(Clone)]
pub struct VersionChainResolver {
    versions: VersionRepository,
    max_hops: usize,
}

impl VersionChainResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::from_config(store, &ResolverConfig::default())
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ResolverConfig) -> Self {
        Self {
            versions: VersionRepository::new(store),
            max_hops: config.max_hops.max(1),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    /// Upper bound on store lookups per walk
    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Newest version reachable from an external subject identifier
    pub async fn find_newest(&self, subject_id: &str, collection_name: &str) -> Result<NewestVersion> {
        let subject = ObjectId::parse_str(subject_id)?;
        self.find_newest_by_id(subject, collection_name).await
    }

    pub async fn find_newest_by_id(
        &self,
        subject: ObjectId,
        collection_name: &str,
    ) -> Result<NewestVersion> {
        let walk = self.walk(subject, collection_name).await?;

        Ok(match walk.records.last() {
            Some(record) if record.is_terminal() => {
                NewestVersion::versioned(record.subject_id, record.version_number)
            }
            _ => NewestVersion::unversioned(walk.end),
        })
    }

    /// Every record on the chain starting at `subject`, oldest first
    pub async fn history(&self, subject: ObjectId, collection_name: &str) -> Result<Vec<VersionRecord>> {
        Ok(self.walk(subject, collection_name).await?.records)
    }

    /// Version records describing `subject` in `collection_name`, store order
    pub async fn versions_of(
        &self,
        subject: ObjectId,
        collection_name: &str,
    ) -> Result<Vec<VersionRecord>> {
        validate_collection(collection_name)?;
        let filter = Filter::new()
            .where_eq(VersionRecord::SUBJECT_ID, subject)
            .where_eq(VersionRecord::COLLECTION_NAME, collection_name);
        self.versions.find(&filter).await
    }

    async fn walk(&self, start: ObjectId, collection_name: &str) -> Result<ChainWalk> {
        validate_collection(collection_name)?;

        let mut visited = HashSet::new();
        let mut records = Vec::new();
        let mut current = start;

        loop {
            if !visited.insert(current) {
                return Err(StorageError::cycle_detected(collection_name, current));
            }
            if visited.len() > self.max_hops {
                return Err(StorageError::chain_too_long(collection_name, start, self.max_hops));
            }

            let matches = self.versions_of(current, collection_name).await?;
            if matches.len() > 1 {
                // Concurrent writers can fork a chain; there is no tie-break.
                warn!(
                    "forked_version_chain subject={} collection={} matches={} (following first)",
                    current,
                    collection_name,
                    matches.len()
                );
            }

            let Some(record) = matches.into_iter().next() else {
                debug!(
                    "version_chain_end subject={} collection={} hops={} (no records)",
                    current,
                    collection_name,
                    visited.len()
                );
                return Ok(ChainWalk {
                    records,
                    end: current,
                });
            };

            let next = record.replacement_version_id;
            records.push(record);

            match next {
                Some(next) => {
                    debug!(
                        "version_chain_hop {} -> {} collection={}",
                        current, next, collection_name
                    );
                    current = next;
                }
                None => {
                    debug!(
                        "version_chain_end subject={} collection={} hops={}",
                        current,
                        collection_name,
                        visited.len()
                    );
                    return Ok(ChainWalk {
                        records,
                        end: current,
                    });
                }
            }
        }
    }
}
