//! GeminiClient - Direct REST API implementation of both collaborators.
//!
//! One client writes the script through a text model and draws each panel
//! through an image-capable model, calling `generateContent` on the Gemini
//! REST API. The API key can be provided directly or loaded from the
//! environment through [`MangaConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use mangaka::gemini::GeminiClient;
//! use mangaka::{MangaConfig, MangaGenerator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // From environment variables (GEMINI_API_KEY, MANGAKA_*)
//! let client = GeminiClient::try_from_env()?;
//!
//! // Direct API key with explicit models
//! let client = GeminiClient::new("your-api-key")
//!     .with_text_model("gemini-2.5-pro")
//!     .with_image_model("gemini-2.5-flash-image")
//!     .with_max_retries(3);
//!
//! let generator = MangaGenerator::new(client.clone(), client);
//! let report = generator.generate("The water cycle").await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ConfigError, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, MangaConfig};
use crate::error::TransportError;
use crate::generator::{ScriptRequest, ScriptWriter};
use crate::hydrate::ImageRequester;
use crate::image::ImageData;
use crate::panel::PanelScript;
use crate::prompts;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Client for the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    max_retries: u32,
}

impl GeminiClient {
    /// Creates a new client with the provided API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn from_config(config: &MangaConfig) -> Self {
        Self::new(config.api_key.clone())
            .with_text_model(config.text_model.clone())
            .with_image_model(config.image_model.clone())
    }

    /// Loads configuration from environment variables.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        MangaConfig::from_env().map(|config| Self::from_config(&config))
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Maximum number of retry attempts (not including the first attempt).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Points the client at a different API root, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TransportError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| TransportError::Request {
                message: format!("Gemini API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let body_text = response.text().await.map_err(|err| {
            TransportError::Other(format!("Failed to read Gemini response body: {err}"))
        })?;

        serde_json::from_str(&body_text).map_err(|err| {
            let truncated_body = if body_text.len() > 500 {
                format!(
                    "{}... (truncated, total {} bytes)",
                    truncate_at_char_boundary(&body_text, 500),
                    body_text.len()
                )
            } else {
                body_text.clone()
            };
            TransportError::InvalidResponse(format!(
                "Failed to parse Gemini response: {err}\n\nResponse body:\n{truncated_body}"
            ))
        })
    }

    /// Runs `operation`, retrying retryable errors up to `max_retries` times.
    async fn with_retries<F, Fut, T>(&self, operation: F) -> Result<T, TransportError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(output) => return Ok(output),
                Err(e) if e.is_retryable() && attempts <= self.max_retries => {
                    let delay = e.retry_delay(attempts);
                    warn!(
                        attempt = attempts,
                        max_attempts = self.max_retries + 1,
                        error = %e,
                        ?delay,
                        "Gemini request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(attempts, error = %e, "Gemini request failed");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl ScriptWriter for GeminiClient {
    async fn write_script(&self, request: &ScriptRequest) -> Result<String, TransportError> {
        let body = GenerateContentRequest {
            contents: vec![Content::user_text(request.prompt.clone())],
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part::Text {
                    text: request.system_instruction.clone(),
                }],
            }),
            generation_config: None,
        };

        debug!(model = %self.text_model, topic = %request.topic, "Requesting script");
        let response = self
            .with_retries(|| self.send_request(&self.text_model, &body))
            .await?;
        extract_text_response(response)
    }
}

#[async_trait]
impl ImageRequester for GeminiClient {
    async fn request_image(
        &self,
        panel: &PanelScript,
        all_panels: &[PanelScript],
        index: usize,
    ) -> Result<Option<ImageData>, TransportError> {
        let prompt = prompts::panel_image_prompt(panel, all_panels, index)
            .map_err(|err| TransportError::Other(format!("Failed to render image prompt: {err}")))?;

        let body = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        };

        debug!(model = %self.image_model, index, panel = panel.panel, "Requesting panel image");
        let response = self
            .with_retries(|| self.send_request(&self.image_model, &body))
            .await?;
        Ok(extract_inline_image(response))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user_text(text: String) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text { text }],
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
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
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: Option<String>,
    data: String,
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

fn response_parts(response: GenerateContentResponse) -> impl Iterator<Item = PartResponse> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, TransportError> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TransportError::InvalidResponse(
            "Gemini API returned no text in the response candidates".into(),
        ));
    }
    Ok(text)
}

/// Returns the first decodable inline image across all response parts.
fn extract_inline_image(response: GenerateContentResponse) -> Option<ImageData> {
    response_parts(response)
        .filter_map(|part| part.inline_data)
        .find_map(|inline| {
            let media_type = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
            match ImageData::from_base64(&inline.data, media_type) {
                Ok(image) if !image.data.is_empty() => Some(image),
                Ok(_) => None,
                Err(err) => {
                    warn!(error = %err, "Skipping undecodable inline image data");
                    None
                }
            }
        })
}

fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> TransportError {
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

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    TransportError::Http {
        status: status.as_u16(),
        message,
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
