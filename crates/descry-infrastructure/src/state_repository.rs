//! Application state repository implementation.
//!
//! Persists application-level state that survives restarts, currently
//! just the active session id.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use descry_core::error::{DescryError, Result};
use descry_core::state::model::AppState;
use descry_core::state::repository::StateRepository;

use crate::paths::DescryPaths;
use crate::storage::AtomicJsonFile;

/// File-backed `StateRepository`.
///
/// The state is cached in memory and written through to disk on every
/// change, so reads never touch the filesystem after construction.
pub struct StateRepositoryImpl {
    /// Cached app state loaded from storage.
    state: Arc<Mutex<AppState>>,
    /// Backing document.
    file: AtomicJsonFile<AppState>,
}

impl StateRepositoryImpl {
    /// Creates a repository backed by the given file and loads the
    /// initial state. A missing or malformed file starts as default state.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let file = AtomicJsonFile::new(path.as_ref().to_path_buf());
        let initial = match file.load() {
            Ok(Some(state)) => state,
            Ok(None) => AppState::default(),
            Err(e) => {
                tracing::warn!("App state file is unreadable ({}), starting fresh", e);
                AppState::default()
            }
        };
        Self {
            state: Arc::new(Mutex::new(initial)),
            file,
        }
    }

    /// Creates a repository at the default location
    /// (`~/.config/descry/app_state.json`).
    pub fn default_location() -> Result<Self> {
        let path = DescryPaths::app_state_file()
            .map_err(|e| DescryError::io(e.to_string()))?;
        Ok(Self::new(path))
    }

    fn write_through(&self, state: &AppState) -> Result<()> {
        self.file
            .save(state)
            .map_err(|e| DescryError::io(format!("Failed to save app state: {}", e)))
    }
}

#[async_trait::async_trait]
impl StateRepository for StateRepositoryImpl {
    async fn save_state(&self, state: AppState) -> Result<()> {
        let mut cached = self.state.lock().await;
        self.write_through(&state)?;
        *cached = state;
        Ok(())
    }

    async fn get_state(&self) -> Result<AppState> {
        Ok(self.state.lock().await.clone())
    }

    async fn get_active_session(&self) -> Option<String> {
        self.state.lock().await.active_session_id.clone()
    }

    async fn set_active_session(&self, session_id: String) -> Result<()> {
        let mut cached = self.state.lock().await;
        let mut next = cached.clone();
        next.active_session_id = Some(session_id);
        self.write_through(&next)?;
        *cached = next;
        Ok(())
    }

    async fn clear_active_session(&self) -> Result<()> {
        let mut cached = self.state.lock().await;
        let mut next = cached.clone();
        next.active_session_id = None;
        self.write_through(&next)?;
        *cached = next;
        Ok(())
    }
}
