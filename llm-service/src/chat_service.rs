//! Chat-completion client for OpenAI-compatible endpoints.
//!
//! Minimal, synchronous (non-streaming) client around
//! `POST {endpoint}/v1/chat/completions`.
//!
//! Constructor validation:
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//! - `cfg.model` must be non-empty
//!
//! Errors are normalized via the unified types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LlmModelConfig;
use crate::error_handler::{ConfigError, LlmServiceError, ProviderError, Result, make_snippet};

/// Thin client for an OpenAI-compatible chat API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (bearer auth default headers, timeout).
#[derive(Debug)]
pub struct ChatCompletionService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl ChatCompletionService {
    /// Creates a new [`ChatCompletionService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::MissingApiKey`] if `cfg.api_key` is `None`
    /// - [`ConfigError::InvalidEndpoint`] / [`ConfigError::EmptyModel`] from validation
    /// - [`LlmServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        cfg.validate()?;
        let api_key = cfg
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(120));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                LlmServiceError::from(ProviderError::Decode(format!(
                    "invalid API key header: {e}"
                )))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.endpoint.trim().trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(120),
            "ChatCompletionService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a **non-streaming** chat completion request.
    ///
    /// Sends exactly one request with a system message and a user message and
    /// returns `choices[0].message.content`.
    ///
    /// # Errors
    /// - [`ProviderError::HttpStatus`] for non-2xx responses
    /// - [`LlmServiceError::HttpTransport`] for client/network failures
    /// - [`ProviderError::Decode`] if the JSON cannot be parsed
    /// - [`ProviderError::EmptyChoices`] if no choice carries content
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, system, user);

        debug!(
            model = %self.cfg.model,
            system_len = system.len(),
            user_len = user.len(),
            "POST {}", self.url_chat
        );

        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis() as u64,
                "chat completion returned non-success status"
            );

            return Err(ProviderError::HttpStatus {
                status,
                url,
                snippet,
            }
            .into());
        }

        let out: ChatCompletionResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "failed to decode chat completion response"
                );
                return Err(ProviderError::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                ))
                .into());
            }
        };

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or(ProviderError::EmptyChoices)?;

        info!(
            model = %self.cfg.model,
            reply_len = content.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion completed"
        );

        Ok(content)
    }
}

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, system: &'a str, user: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Minimal response for `/v1/chat/completions`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}
