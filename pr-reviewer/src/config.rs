//! Environment-driven configuration for the review pipeline.
//!
//! The binary shell loads a full [`AppConfig`] once at startup; every
//! component receives what it needs at construction. Nothing in this crate
//! reads the environment after startup.

use std::env;
use std::path::PathBuf;

use crate::errors::ConfigError;

/// Identifying handle for one pull request. All provider operations are
/// addressed through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestRef {
    pub id: u64,
}

/// Connection settings for the source-control provider (Bitbucket Cloud).
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base, e.g. "https://api.bitbucket.org/2.0".
    pub base_api: String,
    /// Workspace the repository lives in.
    pub workspace: String,
    /// Repository slug inside the workspace.
    pub repo_slug: String,
    /// Username for HTTP Basic authentication.
    pub username: String,
    /// App password paired with the username.
    pub app_password: String,
}

impl ProviderConfig {
    /// Reads provider settings from the environment.
    ///
    /// Variables: `BITBUCKET_WORKSPACE`, `BITBUCKET_REPO_SLUG`,
    /// `BITBUCKET_USERNAME`, `BITBUCKET_APP_PASSWORD` (all required) and
    /// `BITBUCKET_BASE_API` (default `https://api.bitbucket.org/2.0`).
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingVar`] for any absent required variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_api: env_or("BITBUCKET_BASE_API", "https://api.bitbucket.org/2.0"),
            workspace: must_env("BITBUCKET_WORKSPACE")?,
            repo_slug: must_env("BITBUCKET_REPO_SLUG")?,
            username: must_env("BITBUCKET_USERNAME")?,
            app_password: must_env("BITBUCKET_APP_PASSWORD")?,
        })
    }
}

/// Everything the pipeline needs for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub pull_request: PullRequestRef,
    /// Optional pattern-list file consumed by the ignore filter.
    pub ignore_file: PathBuf,
}

impl AppConfig {
    /// Reads the full run configuration from the environment.
    ///
    /// In addition to [`ProviderConfig::from_env`]: `PR_ID` (required, u64)
    /// and `IGNORE_FILE` (default `.ignore`).
    ///
    /// # Errors
    /// Returns [`ConfigError`] for missing variables or an unparsable `PR_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let id = must_env("PR_ID")?
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "PR_ID",
                reason: "expected u64",
            })?;

        Ok(Self {
            provider: ProviderConfig::from_env()?,
            pull_request: PullRequestRef { id },
            ignore_file: PathBuf::from(env_or("IGNORE_FILE", ".ignore")),
        })
    }
}

fn must_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
