//! JSON-backed SessionStore implementation.

use std::path::Path;

use async_trait::async_trait;

use descry_core::error::{DescryError, Result};
use descry_core::session::{Session, SessionStore};

use crate::dto::SessionStoreFileV1;
use crate::paths::DescryPaths;
use crate::storage::{AtomicJsonError, AtomicJsonFile};

/// A store implementation keeping all sessions in one JSON document.
///
/// The whole document is read on `load_all` and rewritten atomically on
/// every `save_all`; there is no per-session file. Malformed or missing
/// content degrades to an empty store instead of an error, so a corrupt
/// file never wedges the application.
pub struct JsonSessionStore {
    file: AtomicJsonFile<SessionStoreFileV1>,
}

impl JsonSessionStore {
    /// Creates a store backed by the given document path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.as_ref().to_path_buf()),
        }
    }

    /// Creates a store at the default location (`~/.config/descry/sessions.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn default_location() -> Result<Self> {
        let path = DescryPaths::sessions_file()
            .map_err(|e| DescryError::io(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Returns the backing document path.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn map_save_error(path: &Path, err: AtomicJsonError) -> DescryError {
        match err {
            AtomicJsonError::JsonError(e) => DescryError::Serialization {
                format: "JSON".to_string(),
                message: e.to_string(),
            },
            other => DescryError::io(format!(
                "Failed to write session store {}: {}",
                path.display(),
                other
            )),
        }
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn load_all(&self) -> Result<Vec<Session>> {
        match self.file.load() {
            Ok(Some(document)) => Ok(document.into_sessions()),
            Ok(None) => Ok(Vec::new()),
            Err(AtomicJsonError::JsonError(e)) => {
                // Malformed prior state is recovered locally, not surfaced.
                tracing::warn!(
                    "Session store {} is malformed ({}), starting empty",
                    self.file.path().display(),
                    e
                );
                Ok(Vec::new())
            }
            Err(other) => Err(DescryError::io(format!(
                "Failed to read session store {}: {}",
                self.file.path().display(),
                other
            ))),
        }
    }

    async fn save_all(&self, sessions: &[Session]) -> Result<()> {
        let document = SessionStoreFileV1::from_sessions(sessions);
        self.file
            .save(&document)
            .map_err(|e| Self::map_save_error(self.file.path(), e))
    }
}
