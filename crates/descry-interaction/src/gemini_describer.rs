//! GeminiDescriber - Direct REST API implementation of the description
//! provider.
//!
//! Calls the Gemini REST API directly without CLI dependency.
//! Configuration is loaded from secret.json.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use descry_core::provider::{DescriptionProvider, ProviderError};
use descry_core::session::ImageUpload;

use crate::config::load_secret_config;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Prompt sent alongside every image.
const DESCRIPTION_PROMPT: &str =
    "Describe this image in one or two sentences of plain language.";

/// Default per-request timeout. A hung provider call becomes a normal
/// failure instead of stalling the whole sequential queue.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Provider implementation that talks to the Gemini HTTP API.
///
/// One `describe` call maps to one `generateContent` request carrying a
/// text prompt part plus the image as inline base64 data. There are no
/// retries; any failure is terminal for that single image.
#[derive(Clone)]
pub struct GeminiDescriber {
    client: Client,
    api_key: String,
    model: String,
    prompt: String,
}

impl GeminiDescriber {
    /// Creates a new describer with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            prompt: DESCRIPTION_PROMPT.to_string(),
        }
    }

    /// Loads configuration from secret.json.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn try_from_config() -> Result<Self, ProviderError> {
        let secret_config = load_secret_config().map_err(|e| {
            ProviderError::Transport(format!("Failed to load secret.json: {}", e))
        })?;

        let gemini_config = secret_config.gemini.ok_or_else(|| {
            ProviderError::Transport(
                "Gemini configuration not found in secret.json".to_string(),
            )
        })?;

        let model = gemini_config
            .model_name
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self::new(gemini_config.api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the description prompt after construction.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Overrides the per-request timeout after construction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    fn build_request(&self, upload: &ImageUpload) -> Result<GenerateContentRequest, ProviderError> {
        if upload.bytes.is_empty() {
            return Err(ProviderError::UnsupportedPayload(format!(
                "'{}' has no image data",
                upload.file_name
            )));
        }
        if !upload.mime_type.starts_with("image/") {
            return Err(ProviderError::UnsupportedPayload(format!(
                "'{}' is not an image ({})",
                upload.file_name, upload.mime_type
            )));
        }

        let parts = vec![
            Part::Text {
                text: self.prompt.clone(),
            },
            Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: upload.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&upload.bytes),
                },
            },
        ];

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        })
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ProviderError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                ProviderError::Transport(format!("Gemini API request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ProviderError::Transport(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl DescriptionProvider for GeminiDescriber {
    async fn describe(&self, upload: &ImageUpload) -> Result<String, ProviderError> {
        tracing::debug!(
            "Requesting description for '{}' ({} bytes)",
            upload.file_name,
            upload.bytes.len()
        );
        let request = self.build_request(upload)?;
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<i32>,
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ProviderError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or(ProviderError::EmptyResponse)
}

fn map_http_error(status: StatusCode, body: String) -> ProviderError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    ProviderError::Http {
        status: Some(status.as_u16()),
        message,
    }
}
