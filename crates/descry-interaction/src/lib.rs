//! Provider adapters for descry.
//!
//! Two backends: the Gemini `generateContent` REST API and a generic
//! multipart description endpoint.

pub mod config;
pub mod gemini_describer;
pub mod http_describer;

pub use config::{GeminiConfig, SecretConfig, load_secret_config};
pub use gemini_describer::GeminiDescriber;
pub use http_describer::HttpDescriber;
