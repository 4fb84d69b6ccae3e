//! HttpDescriber - adapter for a generic description endpoint.
//!
//! Speaks the plain wire contract: one image uploaded as a single-field
//! multipart submission, one JSON response carrying a `description`
//! field. Useful for self-hosted description services that front the
//! actual model.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use descry_core::provider::{DescriptionProvider, ProviderError};
use descry_core::session::ImageUpload;

/// Default per-request timeout, matching the Gemini adapter.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Multipart field name the endpoint expects.
const IMAGE_FIELD: &str = "image";

#[derive(Deserialize)]
struct DescriptionResponse {
    description: String,
}

/// Provider implementation posting to a caller-supplied endpoint.
#[derive(Clone)]
pub struct HttpDescriber {
    client: Client,
    endpoint: String,
}

impl HttpDescriber {
    /// Creates a describer for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Overrides the per-request timeout after construction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    fn build_form(upload: &ImageUpload) -> Result<Form, ProviderError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| {
                ProviderError::UnsupportedPayload(format!(
                    "'{}' has an invalid MIME type ({}): {}",
                    upload.file_name, upload.mime_type, e
                ))
            })?;
        Ok(Form::new().part(IMAGE_FIELD, part))
    }
}

#[async_trait]
impl DescriptionProvider for HttpDescriber {
    async fn describe(&self, upload: &ImageUpload) -> Result<String, ProviderError> {
        let form = Self::build_form(upload)?;

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                ProviderError::Transport(format!("Description request failed: {err}"))
            })?;

        if !response.status().is_success() {
            // Body contents are unspecified on failure; only the status matters.
            return Err(ProviderError::Http {
                status: Some(response.status().as_u16()),
                message: format!("Description endpoint returned {}", response.status()),
            });
        }

        let parsed: DescriptionResponse = response.json().await.map_err(|err| {
            ProviderError::Transport(format!("Failed to parse description response: {err}"))
        })?;

        Ok(parsed.description)
    }
}
