//! Configuration file management for descry.
//!
//! Supports reading secrets from `~/.config/descry/secret.json`.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use descry_core::error::{DescryError, Result};
use descry_infrastructure::DescryPaths;

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file from ~/.config/descry/secret.json
pub fn load_secret_config() -> Result<SecretConfig> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        return Err(DescryError::io(format!(
            "Configuration file not found at: {}",
            config_path.display()
        )));
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        DescryError::io(format!(
            "Failed to read configuration file at {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| DescryError::Serialization {
        format: "JSON".to_string(),
        message: format!(
            "Failed to parse configuration file at {}: {}",
            config_path.display(),
            e
        ),
    })
}

/// Returns the path to the configuration file: ~/.config/descry/secret.json
fn get_config_path() -> Result<PathBuf> {
    DescryPaths::secret_file().map_err(|e| DescryError::io(e.to_string()))
}
