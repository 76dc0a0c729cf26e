//! Version record writes
//!
//! [`VersionLedger`] creates version records and links a previous revision
//! to its replacement. It does not lock: two writers superseding the same
//! record concurrently can both pass the `AlreadySuperseded` check, and two
//! `record_revision` calls can pick the same version number. Readers see
//! such forks as described in [`super::resolver`].

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::config::ResolverConfig;
use crate::domain::ports::validate_collection;
use crate::domain::{DocumentStore, ObjectId, VersionRecord, VersionRepository};
use crate::error::{Result, StorageError};

use super::resolver::VersionChainResolver;

/// Input of [`VersionLedger::create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub subject_id: ObjectId,
    /// User creating the revision
    pub created_by: ObjectId,
    pub version_number: u32,
    pub collection_name: String,
    pub description: String,
    pub application: String,
}

impl NewVersion {
    /// First revision of `subject_id` in `collection_name`
    pub fn new(
        subject_id: ObjectId,
        created_by: ObjectId,
        collection_name: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            created_by,
            version_number: 1,
            collection_name: collection_name.into(),
            description: String::new(),
            application: String::new(),
        }
    }

    pub fn with_number(mut self, version_number: u32) -> Self {
        self.version_number = version_number;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }
}

/// Writes version records
#[derive(Clone)]
pub struct VersionLedger {
    versions: VersionRepository,
    resolver: VersionChainResolver,
}

impl VersionLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::from_config(store, &ResolverConfig::default())
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &ResolverConfig) -> Self {
        Self {
            versions: VersionRepository::new(Arc::clone(&store)),
            resolver: VersionChainResolver::from_config(store, config),
        }
    }

    pub fn resolver(&self) -> &VersionChainResolver {
        &self.resolver
    }

    /// Persist a fresh, terminal version record
    ///
    /// The record gets a new id and `createdAt = now`. Existing records of
    /// the same subject are left untouched.
    pub async fn create(&self, new: NewVersion) -> Result<VersionRecord> {
        validate_collection(&new.collection_name)?;

        let record = VersionRecord {
            id: ObjectId::new(),
            subject_id: new.subject_id,
            created_by: new.created_by,
            version_number: new.version_number,
            collection_name: new.collection_name,
            replacement_version_id: None,
            created_at: Utc::now(),
            description: new.description,
            application: new.application,
        };

        let stored = self.versions.insert(&record).await?;
        info!(
            "version_created subject={} collection={} number={}",
            stored.subject_id, stored.collection_name, stored.version_number
        );
        Ok(stored)
    }

    /// Mark `previous` as replaced by `replacement`
    ///
    /// Links the first record of `previous` in `collection_name`. Fails with
    /// `NotFound` when `previous` has no record and `AlreadySuperseded` when
    /// the record already points somewhere. The link is refused with
    /// `InvalidArgument` when `previous` is reachable from `replacement` or
    /// when the replacement's version number does not exceed the previous one.
    pub async fn supersede(
        &self,
        previous: ObjectId,
        replacement: ObjectId,
        collection_name: &str,
    ) -> Result<VersionRecord> {
        if previous == replacement {
            return Err(StorageError::invalid_argument(format!(
                "Subject {} cannot replace itself",
                previous
            )));
        }

        let mut record = self
            .resolver
            .versions_of(previous, collection_name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::not_found(collection_name, previous))?;

        if let Some(existing) = record.replacement_version_id {
            return Err(StorageError::already_superseded(previous, existing));
        }

        let downstream = self.resolver.history(replacement, collection_name).await?;
        if downstream.iter().any(|r| r.subject_id == previous) {
            return Err(StorageError::invalid_argument(format!(
                "Linking {} -> {} would create a cycle",
                previous, replacement
            )));
        }
        if let Some(next) = downstream.first() {
            if next.version_number <= record.version_number {
                return Err(StorageError::invalid_argument(format!(
                    "Replacement {} has version number {}, not above {}",
                    replacement, next.version_number, record.version_number
                )));
            }
        }

        self.versions
            .update_field(&record.id, VersionRecord::REPLACEMENT_VERSION_ID, replacement)
            .await?;
        record.replacement_version_id = Some(replacement);

        info!(
            "version_superseded {} -> {} collection={}",
            previous, replacement, collection_name
        );
        Ok(record)
    }

    /// Append a revision to the chain that `previous` belongs to
    ///
    /// Without `previous` this is a plain [`create`](Self::create). With it,
    /// the newest record reachable from `previous` is superseded by the new
    /// one and the version number continues from it. The new subject must not
    /// have a version record yet.
    pub async fn record_revision(
        &self,
        previous: Option<ObjectId>,
        mut new: NewVersion,
    ) -> Result<VersionRecord> {
        let Some(previous) = previous else {
            return self.create(new).await;
        };

        let newest = self
            .resolver
            .find_newest_by_id(previous, &new.collection_name)
            .await?;
        let Some(number) = newest.version_number else {
            return Err(StorageError::not_found(&new.collection_name, newest.subject_id));
        };
        if !self
            .resolver
            .versions_of(new.subject_id, &new.collection_name)
            .await?
            .is_empty()
        {
            return Err(StorageError::invalid_argument(format!(
                "Subject {} already has a version record in '{}'",
                new.subject_id, new.collection_name
            )));
        }

        new.version_number = number.checked_add(1).ok_or_else(|| {
            StorageError::invalid_argument(format!(
                "Version number overflow after {} for subject {}",
                number, newest.subject_id
            ))
        })?;

        let created = self.create(new).await?;
        self.supersede(newest.subject_id, created.subject_id, &created.collection_name)
            .await?;
        Ok(created)
    }
}
