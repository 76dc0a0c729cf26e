//! Document shapes
//!
//! Each document type is a plain data shape plus the [`Document`] impl that
//! names its collection. Field names serialize in camelCase so that filters
//! and stored documents agree (`subjectId`, `collectionName`, ...).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::object_id::ObjectId;

/// A record shape stored in one collection of the document store
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection the documents live in
    const COLLECTION: &'static str;

    /// Document identifier (`_id`)
    fn id(&self) -> ObjectId;
}

// ═══════════════════════════════════════════════════════════════════════════
// Version Records
// ═══════════════════════════════════════════════════════════════════════════

/// One revision in a version chain
///
/// Immutable once created, except for `replacement_version_id`, which is set
/// exactly once when a newer revision supersedes this one. The link holds the
/// superseding revision's `subject_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Document revision this version describes
    pub subject_id: ObjectId,
    /// User account that created the revision
    pub created_by: ObjectId,
    pub version_number: u32,
    pub collection_name: String,
    #[serde(default)]
    pub replacement_version_id: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub application: String,
}

impl VersionRecord {
    /// Field names used in store filters
    pub const SUBJECT_ID: &'static str = "subjectId";
    pub const COLLECTION_NAME: &'static str = "collectionName";
    pub const REPLACEMENT_VERSION_ID: &'static str = "replacementVersionId";

    /// True when no newer revision supersedes this one
    pub fn is_terminal(&self) -> bool {
        self.replacement_version_id.is_none()
    }
}

impl Document for VersionRecord {
    const COLLECTION: &'static str = "versions";

    fn id(&self) -> ObjectId {
        self.id
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Design Documents
// ═══════════════════════════════════════════════════════════════════════════

/// Biological design module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub format_id: Option<ObjectId>,
    #[serde(default)]
    pub application_id: Option<ObjectId>,
    pub created_by: ObjectId,
    pub created_at: DateTime<Utc>,
}

impl Module {
    pub fn new(name: impl Into<String>, created_by: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            format_id: None,
            application_id: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_format(mut self, format_id: ObjectId) -> Self {
        self.format_id = Some(format_id);
        self
    }

    pub fn with_application(mut self, application_id: ObjectId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    /// Copy of this module as a fresh revision (new identifier, new timestamp)
    pub fn revise(&self) -> Self {
        Self {
            id: ObjectId::new(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

impl Document for Module {
    const COLLECTION: &'static str = "modules";

    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Data format a module is expressed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: ObjectId,
    pub created_at: DateTime<Utc>,
}

impl Format {
    pub fn new(name: impl Into<String>, created_by: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl Document for Format {
    const COLLECTION: &'static str = "formats";

    fn id(&self) -> ObjectId {
        self.id
    }
}

/// Tool or workflow that produces or consumes modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_by: ObjectId,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn new(name: impl Into<String>, created_by: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            description: String::new(),
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl Document for Application {
    const COLLECTION: &'static str = "applications";

    fn id(&self) -> ObjectId {
        self.id
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
