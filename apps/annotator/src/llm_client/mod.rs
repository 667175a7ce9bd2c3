//! LLM client: every model call made by the annotator goes through this module.
//!
//! Talks to the OpenAI Responses API (`POST /v1/responses`). The staged runner
//! only sees the `ModelCaller` trait, so tests can swap in scripted callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const RESPONSES_PATH: &str = "/v1/responses";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Anything that can answer `(input, instructions, model) -> output_text`.
///
/// The staged runner treats every error from a caller as fatal.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn call(&self, input: &str, instructions: &str, model: &str)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Body of a Responses API reply. Also embedded in batch result lines.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl ResponsesResponse {
    /// Concatenates every `output_text` part of every `message` item.
    /// Returns `None` when the model produced no text at all.
    pub fn output_text(&self) -> Option<String> {
        let text: String = self
            .output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.part_type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Wraps the Responses API with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_output_tokens: Option<u32>,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        timeout: Duration,
        max_output_tokens: Option<u32>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_output_tokens,
        })
    }

    /// Makes a raw call to the Responses API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn create_response(
        &self,
        input: &str,
        instructions: &str,
        model: &str,
    ) -> Result<ResponsesResponse, LlmError> {
        let request_body = ResponsesRequest {
            model,
            instructions,
            input,
            max_output_tokens: self.max_output_tokens,
        };
        let url = format!("{}{}", self.base_url, RESPONSES_PATH);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let parsed: ResponsesResponse = serde_json::from_str(&body)?;

            if let Some(usage) = &parsed.usage {
                debug!(
                    "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
                    model, usage.input_tokens, usage.output_tokens
                );
            }

            return Ok(parsed);
        }

        // Exhausted 429s surface as RateLimited; other retryable failures as-is.
        match last_error {
            Some(LlmError::Api { status: 429, .. }) | None => Err(LlmError::RateLimited {
                retries: MAX_RETRIES,
            }),
            Some(e) => Err(e),
        }
    }
}

#[async_trait]
impl ModelCaller for LlmClient {
    async fn call(
        &self,
        input: &str,
        instructions: &str,
        model: &str,
    ) -> Result<String, LlmError> {
        let response = self.create_response(input, instructions, model).await?;
        response.output_text().ok_or(LlmError::EmptyContent)
    }
}
