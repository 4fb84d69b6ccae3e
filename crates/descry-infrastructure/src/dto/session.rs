//! Session store DTOs.
//!
//! Persistence structs are kept separate from the domain model so the
//! on-disk schema can evolve without touching business logic. The store
//! document carries a schema version for future migrations; today only
//! V1 exists.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use descry_core::session::{ImageRecord, Session};

/// The whole-store document: a versioned envelope around the complete
/// ordered session list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStoreFileV1 {
    /// Schema version (currently 1)
    #[serde(default = "default_store_version")]
    pub version: u32,
    /// All sessions, in store order
    #[serde(default)]
    pub sessions: Vec<SessionV1>,
}

fn default_store_version() -> u32 {
    1
}

impl SessionStoreFileV1 {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        Self {
            version: 1,
            sessions: sessions.iter().map(SessionV1::from).collect(),
        }
    }

    pub fn into_sessions(self) -> Vec<Session> {
        self.sessions.into_iter().map(SessionV1::into_domain).collect()
    }
}

/// Represents V1 of the session data schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionV1 {
    /// Unique session identifier
    pub id: String,
    /// Human-readable session name
    pub name: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
    /// Uploaded images with their descriptions, in upload order
    #[serde(default)]
    pub images: Vec<ImageRecordV1>,
}

/// Represents V1 of the image record schema.
///
/// Raw image bytes are never persisted; the optional `path` reference is
/// all the store keeps for re-rendering pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecordV1 {
    /// Stable per-record identifier
    pub id: String,
    /// Original filename
    pub file_name: String,
    /// MIME type of the image
    pub mime_type: String,
    /// Path to the source file, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Description text (empty or the failure placeholder when unresolved)
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<&Session> for SessionV1 {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            images: session.images.iter().map(ImageRecordV1::from).collect(),
        }
    }
}

impl SessionV1 {
    pub fn into_domain(self) -> Session {
        Session {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images: self
                .images
                .into_iter()
                .map(ImageRecordV1::into_domain)
                .collect(),
        }
    }
}

impl From<&ImageRecord> for ImageRecordV1 {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            file_name: record.file_name.clone(),
            mime_type: record.mime_type.clone(),
            path: record.path.clone(),
            description: record.description.clone(),
        }
    }
}

impl ImageRecordV1 {
    pub fn into_domain(self) -> ImageRecord {
        ImageRecord {
            id: self.id,
            file_name: self.file_name,
            mime_type: self.mime_type,
            path: self.path,
            description: self.description,
        }
    }
}
