//! Unified path management for descry configuration files.
//!
//! All descry configuration, secrets, and session data live under one
//! config directory so every storage component resolves paths the same
//! way on every platform.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for descry.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/descry/            # Config directory
/// ├── sessions.json            # Whole-document session store
/// ├── app_state.json           # Application state (active session id)
/// └── secret.json              # API keys
/// ```
pub struct DescryPaths;

impl DescryPaths {
    /// Returns the descry configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g. `~/.config/descry/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("descry"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the session store document.
    pub fn sessions_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("sessions.json"))
    }

    /// Returns the path to the application state file.
    pub fn app_state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("app_state.json"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g. 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
