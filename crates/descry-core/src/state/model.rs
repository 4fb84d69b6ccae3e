//! Application state model.

use serde::{Deserialize, Serialize};

/// Application-level state that persists across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// The currently active session ID, if any
    #[serde(default)]
    pub active_session_id: Option<String>,
}
