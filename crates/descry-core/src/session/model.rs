//! Session domain model.
//!
//! This module contains the core Session entity and the image record
//! types that business logic operates on, independent of any specific
//! storage format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Description text written into a record when its provider call fails.
pub const FAILED_DESCRIPTION_PLACEHOLDER: &str = "Failed to generate description";

/// Represents a named grouping of images and their descriptions.
///
/// A session contains:
/// - A user-supplied name (validated non-empty at creation)
/// - An ordered list of image records (upload order is preserved)
/// - Timestamps for creation and last update
///
/// This is the "pure" domain model; persistence DTOs live in the
/// infrastructure crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Human-readable session name
    pub name: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
    /// Uploaded images with their descriptions, in upload order
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl Session {
    /// Creates a new empty session with a fresh UUID and current timestamps.
    pub fn new(name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now.clone(),
            updated_at: now,
            images: Vec::new(),
        }
    }

    /// Refreshes the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// One uploaded image paired with its (possibly pending) description.
///
/// The `id` is assigned once at submission time and never changes; async
/// description outcomes are merged back by this identifier, never by
/// list position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Stable per-record identifier (UUID format)
    pub id: String,
    /// Original filename
    pub file_name: String,
    /// MIME type of the image
    pub mime_type: String,
    /// Path to the source file on disk, if known.
    /// Raw image bytes are never persisted; this reference is all the
    /// store keeps for re-rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Description text; empty until the provider call resolves
    #[serde(default)]
    pub description: String,
}

/// The raw image payload handed to `submit_images`.
///
/// Owns the bytes for the duration of the description request; the bytes
/// are dropped once the batch is merged into the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    /// Original filename
    pub file_name: String,
    /// MIME type of the image
    pub mime_type: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Path to the source file, if the upload came from disk
    pub path: Option<PathBuf>,
}

impl ImageUpload {
    /// Creates an upload from raw parts.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
            path: None,
        }
    }

    /// Reads an upload from a file on disk, guessing the MIME type from
    /// the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime_type,
            bytes,
            path: Some(path.to_path_buf()),
        })
    }
}

/// Lifecycle of one record's description within the working view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionStatus {
    /// Request not yet resolved
    Pending,
    /// Description text available
    Ready,
    /// Request failed; record carries the failure placeholder
    Failed,
}

/// One entry of the working view: the in-memory, possibly-optimistic
/// representation of the active session's images, distinct from the
/// persisted copy until the batch is merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingImage {
    pub record: ImageRecord,
    pub status: DescriptionStatus,
}

impl WorkingImage {
    /// Wraps an already-described record (loaded from a session).
    pub fn settled(record: ImageRecord) -> Self {
        Self {
            record,
            status: DescriptionStatus::Ready,
        }
    }

    /// Wraps a freshly submitted record awaiting its description.
    pub fn pending(record: ImageRecord) -> Self {
        Self {
            record,
            status: DescriptionStatus::Pending,
        }
    }
}
