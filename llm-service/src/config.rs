//! Configuration for the review-model endpoint.

use crate::error_handler::{
    ConfigError, Result, env_opt, env_opt_f32, env_opt_u32, env_opt_u64, must_env,
    validate_http_endpoint,
};

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `model`: The model identifier (e.g., `"gpt-4o"`).
/// - `endpoint`: Base URL of an OpenAI-compatible API (no trailing path).
/// - `api_key`: Optional bearer credential; validated at service construction.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff (alternative to temperature).
/// - `timeout_secs`: Optional request timeout in seconds.
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// Model identifier string (e.g., `"gpt-4o"`).
    pub model: String,

    /// Base API URL (local server or remote API).
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Reads the model configuration from the environment.
    ///
    /// Variables:
    /// - `OPENAI_API_KEY` (required)
    /// - `LLM_MODEL` (default `gpt-4o`)
    /// - `LLM_ENDPOINT` (default `https://api.openai.com`)
    /// - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TOP_P`, `LLM_TIMEOUT_SECS` (optional)
    ///
    /// # Errors
    /// Returns [`ConfigError`] variants for a missing key, an invalid
    /// endpoint scheme, or unparsable numeric values.
    pub fn from_env() -> Result<Self> {
        let api_key = must_env("OPENAI_API_KEY")?;
        let model = env_opt("LLM_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let endpoint = env_opt("LLM_ENDPOINT").unwrap_or_else(|| "https://api.openai.com".to_string());

        let cfg = Self {
            model,
            endpoint,
            api_key: Some(api_key),
            max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
            temperature: env_opt_f32("LLM_TEMPERATURE")?,
            top_p: env_opt_f32("LLM_TOP_P")?,
            timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the invariants a completion service relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] if `model` is blank
    /// - [`ConfigError::InvalidEndpoint`] if `endpoint` has no http scheme
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint(&self.endpoint)
    }
}
