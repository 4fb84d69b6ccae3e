//! Description provider trait.
//!
//! Defines the interface for the external multimodal inference service
//! that turns one image into one text description.

use crate::session::ImageUpload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a description provider can return for a single request.
///
/// Every variant is terminal for the request that raised it: there is no
/// retry policy, the caller maps the failure into a placeholder description
/// and continues with the next queued image.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ProviderError {
    /// The request never produced an HTTP response (connect/timeout/DNS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("HTTP error: {message}")]
    Http {
        status: Option<u16>,
        message: String,
    },

    /// The provider answered successfully but returned no usable text.
    #[error("Provider returned no text in the response")]
    EmptyResponse,

    /// The payload cannot be sent to this provider (e.g. unsupported MIME type).
    #[error("Unsupported payload: {0}")]
    UnsupportedPayload(String),
}

/// An abstract provider that produces a natural-language description
/// for a single image payload.
///
/// This trait decouples the session manager from the concrete inference
/// backend (HTTP API, local model, test double). Implementations receive
/// exactly one image per call and return either the description text or a
/// typed failure.
#[async_trait]
pub trait DescriptionProvider: Send + Sync {
    /// Requests a description for one image.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The description text
    /// - `Err(ProviderError)`: The request failed; the caller decides how
    ///   to surface it
    async fn describe(&self, upload: &ImageUpload) -> std::result::Result<String, ProviderError>;
}
