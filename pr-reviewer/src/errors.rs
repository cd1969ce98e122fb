//! Crate-wide error hierarchy for pr-reviewer.
//!
//! Goals:
//! - Single root `Error` for the pipeline entry.
//! - Provider-aware mapping (401→Unauthorized, 429→RateLimited, 5xx→Server, etc.).
//! - No dynamic dispatch, no async-trait, ergonomic `?` via `From` impls.
//!
//! `PostActionError` is deliberately *not* a variant of [`Error`]: terminal
//! actions on the pull request are best-effort and recorded per action,
//! whereas retrieval and the model call abort the whole run.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type PrResult<T> = Result<T, Error>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching pull-request metadata, diffstat, or file content failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// The review-model call failed outright.
    #[error(transparent)]
    ReviewProvider(#[from] ReviewProviderError),

    /// Configuration problems (missing env, bad numbers).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Short name of the pipeline stage the error belongs to, for the
    /// one-line failure report.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Retrieval(_) => "fetch",
            Error::ReviewProvider(_) => "review",
            Error::Config(_) => "configuration",
        }
    }
}

/// Failure while retrieving pull-request data from the source-control
/// provider. Any variant aborts the run; there are no partial fetches.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// Gateway/Server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (4xx/3xx) not covered above.
    #[error("http status error: {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Payload could not be decoded as expected.
    #[error("decode error: {0}")]
    Decode(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A spawned fetch task failed to join.
    #[error("fetch task failed: {0}")]
    TaskJoin(String),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return RetrievalError::Timeout;
        }
        if e.is_decode() {
            return RetrievalError::Decode(e.to_string());
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => RetrievalError::Unauthorized,
                403 => RetrievalError::Forbidden,
                404 => RetrievalError::NotFound,
                429 => RetrievalError::RateLimited,
                500..=599 => RetrievalError::Server(code),
                _ => RetrievalError::HttpStatus(code),
            };
        }
        RetrievalError::Network(e.to_string())
    }
}

/// The review-model call failed (network, auth, quota, malformed envelope).
///
/// A reply that parses to zero per-file sections is *not* this error; that is
/// the normal clean-pull-request outcome.
#[derive(Debug, Error)]
#[error("review model call failed: {0}")]
pub struct ReviewProviderError(#[from] pub llm_service::LlmServiceError);

/// Best-effort failure of one terminal action (comment, approve, merge,
/// request-changes). Recorded per action; never aborts the run.
#[derive(Debug, Error)]
pub enum PostActionError {
    /// Provider rejected the action.
    #[error("http status {status}: {snippet}")]
    HttpStatus { status: u16, snippet: String },

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without status.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for PostActionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PostActionError::Timeout;
        }
        if let Some(status) = e.status() {
            return PostActionError::HttpStatus {
                status: status.as_u16(),
                snippet: e.to_string(),
            };
        }
        PostActionError::Network(e.to_string())
    }
}

/// Configuration and setup errors (missing env vars, bad numbers).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse.
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },
}
