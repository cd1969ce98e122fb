//! Chat-completion service for the review pipeline.
//!
//! One provider surface: an OpenAI-compatible `POST /v1/chat/completions`
//! endpoint, called synchronously (non-streaming). Configuration is read from
//! the environment, errors are unified in [`error_handler`], and the client is
//! constructed once and injected wherever a completion is needed.

pub mod chat_service;
pub mod config;
pub mod error_handler;

pub use chat_service::ChatCompletionService;
pub use config::LlmModelConfig;
pub use error_handler::{LlmServiceError, Result};
