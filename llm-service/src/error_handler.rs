//! Unified error handling for `llm-service`.
//!
//! A single top-level [`LlmServiceError`] for the whole crate, with
//! domain-specific sub-enums for configuration and provider failures. Small
//! helpers for reading/validating environment variables return the unified
//! [`Result<T>`] alias.

use reqwest::StatusCode;
use thiserror::Error;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmServiceError>;

/// Top-level error for the `llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmServiceError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider-side failures of a completion call.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[llm-service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[llm-service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (tokens, timeouts, sampling knobs).
    #[error("[llm-service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// API key is required by the endpoint but was not provided.
    #[error("[llm-service] missing API key")]
    MissingApiKey,

    /// The endpoint is empty or does not start with http/https.
    #[error("[llm-service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Model name was empty or invalid.
    #[error("[llm-service] model name must not be empty")]
    EmptyModel,
}

/// Error enum for a single completion call against the provider.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream returned a non-successful HTTP status.
    #[error("[llm-service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[llm-service] decode error: {0}")]
    Decode(String),

    /// The completion envelope parsed but carried no usable choice.
    #[error("[llm-service] completion returned no choices")]
    EmptyChoices,
}

/// Compresses a response body into a short, single-line snippet for logs and
/// error messages. Bodies can be arbitrarily large or multi-line; errors must
/// stay greppable.
pub fn make_snippet(body: &str) -> String {
    const MAX_CHARS: usize = 240;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > MAX_CHARS {
        let mut s: String = flat.chars().take(MAX_CHARS).collect();
        s.push('…');
        s
    } else {
        flat
    }
}

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`ConfigError::MissingVar`] if the variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional env var, treating unset/empty as `None`.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u32>().map(Some).map_err(|_| {
            LlmServiceError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            LlmServiceError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `f32`.
pub fn env_opt_f32(name: &'static str) -> Result<Option<f32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<f32>().map(Some).map_err(|_| {
            LlmServiceError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected f32",
            })
        }),
        _ => Ok(None),
    }
}

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidEndpoint`] otherwise.
pub fn validate_http_endpoint(value: &str) -> Result<()> {
    let v = value.trim();
    if v.starts_with("http://") || v.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEndpoint(value.to_string()).into())
    }
}
