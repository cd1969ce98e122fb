//! Bitbucket Cloud provider (REST 2.0).
//!
//! Endpoints used:
//! - GET  /2.0/repositories/{workspace}/{repo_slug}/pullrequests/{id}
//! - GET  diffstat link taken from the pull-request `links` map
//! - GET  per-file content link taken from each diffstat entry
//! - POST /2.0/.../pullrequests/{id}/comments
//! - POST /2.0/.../pullrequests/{id}/approve
//! - POST /2.0/.../pullrequests/{id}/request-changes
//! - POST /2.0/.../pullrequests/{id}/merge
//!
//! Retrieval calls map failures into [`RetrievalError`] (run-aborting);
//! mutating calls map into [`PostActionError`] (best-effort, recorded per
//! action). The asymmetry is part of the pipeline contract.

pub mod types;
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::{ProviderConfig, PullRequestRef};
use crate::errors::{PostActionError, PrResult, RetrievalError};

/// Thin Bitbucket client with a shared reqwest instance and static Basic
/// credentials. Cheap to clone; safe to share across fetch fan-out tasks.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: Client,
    /// "{base_api}/repositories/{workspace}/{repo_slug}"
    base_repo: String,
    username: String,
    app_password: String,
}

impl BitbucketClient {
    /// Constructs a Bitbucket client with an injected reqwest instance.
    pub fn new(http: Client, cfg: &ProviderConfig) -> Self {
        let base_repo = format!(
            "{}/repositories/{}/{}",
            cfg.base_api.trim_end_matches('/'),
            urlencoding::encode(&cfg.workspace),
            urlencoding::encode(&cfg.repo_slug),
        );
        Self {
            http,
            base_repo,
            username: cfg.username.clone(),
            app_password: cfg.app_password.clone(),
        }
    }

    /// Builds the client together with its HTTP transport (connect and
    /// request timeouts owned here).
    ///
    /// # Errors
    /// Returns [`RetrievalError::Network`] if the transport cannot be built.
    pub fn from_config(cfg: &ProviderConfig) -> PrResult<Self> {
        let http = Client::builder()
            .user_agent("pr-sentinel/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Network(e.to_string()))?;
        Ok(Self::new(http, cfg))
    }

    fn pr_url(&self, pr: PullRequestRef, suffix: &str) -> String {
        format!("{}/pullrequests/{}{}", self.base_repo, pr.id, suffix)
    }

    /// Fetches pull-request metadata, including the named `links` map the
    /// diff summary is addressed through.
    pub async fn get_pull_request(
        &self,
        pr: PullRequestRef,
    ) -> Result<PullRequestMeta, RetrievalError> {
        let url = self.pr_url(pr, "");
        debug!(%url, "GET pull request");
        let meta = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(meta)
    }

    /// Fetches the diff summary from the address advertised in the
    /// pull-request metadata.
    pub async fn get_diffstat(&self, href: &str) -> Result<Diffstat, RetrievalError> {
        debug!(url = %href, "GET diffstat");
        let diffstat = self
            .http
            .get(href)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(diffstat)
    }

    /// Fetches a file's full current content from its content link.
    pub async fn get_raw(&self, href: &str) -> Result<String, RetrievalError> {
        debug!(url = %href, "GET raw file");
        let body = self
            .http
            .get(href)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    /// Posts one inline comment anchored to a file path.
    pub async fn post_inline_comment(
        &self,
        pr: PullRequestRef,
        path: &str,
        body: &str,
    ) -> Result<(), PostActionError> {
        #[derive(Serialize)]
        struct Content<'a> {
            raw: &'a str,
        }
        #[derive(Serialize)]
        struct Inline<'a> {
            path: &'a str,
        }
        #[derive(Serialize)]
        struct CommentRequest<'a> {
            content: Content<'a>,
            inline: Inline<'a>,
        }

        let url = self.pr_url(pr, "/comments");
        debug!(%url, path, "POST inline comment");
        let req = CommentRequest {
            content: Content { raw: body },
            inline: Inline { path },
        };
        self.post_json(&url, &req).await
    }

    /// Approves the pull request.
    pub async fn approve(&self, pr: PullRequestRef) -> Result<(), PostActionError> {
        let url = self.pr_url(pr, "/approve");
        debug!(%url, "POST approve");
        self.post_empty(&url).await
    }

    /// Requests changes on the pull request as a whole.
    pub async fn request_changes(&self, pr: PullRequestRef) -> Result<(), PostActionError> {
        let url = self.pr_url(pr, "/request-changes");
        debug!(%url, "POST request-changes");
        self.post_empty(&url).await
    }

    /// Merges the pull request with the given merge message.
    pub async fn merge(&self, pr: PullRequestRef, message: &str) -> Result<(), PostActionError> {
        #[derive(Serialize)]
        struct MergeRequest<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            message: &'a str,
        }

        let url = self.pr_url(pr, "/merge");
        debug!(%url, "POST merge");
        let req = MergeRequest {
            kind: "pullrequest",
            message,
        };
        self.post_json(&url, &req).await
    }

    async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<(), PostActionError> {
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(body)
            .send()
            .await?;
        Self::check_action_status(resp).await
    }

    async fn post_empty(&self, url: &str) -> Result<(), PostActionError> {
        let resp = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        Self::check_action_status(resp).await
    }

    /// Non-2xx terminal-action responses become a [`PostActionError`]
    /// carrying a short body snippet.
    async fn check_action_status(resp: reqwest::Response) -> Result<(), PostActionError> {
        let status = resp.status();
        if !status.is_success() {
            let snippet: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(240)
                .collect();
            return Err(PostActionError::HttpStatus {
                status: status.as_u16(),
                snippet,
            });
        }
        Ok(())
    }
}
