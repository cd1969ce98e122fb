//! Outcome driver: the terminal action on the pull request.
//!
//! Clean review → approve, then merge with a fixed message. Findings →
//! one inline comment per file (best-effort fan-out), then request changes.
//! Every action's own failure is recorded in the report and logged; none of
//! them aborts the run.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::config::PullRequestRef;
use crate::errors::PostActionError;
use crate::provider::BitbucketClient;
use crate::review::ReviewResult;

/// Fixed message attached to the automated merge of a clean pull request.
const MERGE_MESSAGE: &str = "Automated merge: review found no issues.";

/// Configuration for the outcome step.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Concurrency for inline-comment posting.
    pub max_concurrency: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_concurrency: env_usize("REVIEW_COMMENT_CONCURRENCY", 4),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Result of one inline-comment attempt.
#[derive(Debug)]
pub struct CommentOutcome {
    /// File path the comment was anchored to.
    pub path: String,
    /// Failure of this attempt, if any; other attempts are unaffected.
    pub error: Option<PostActionError>,
}

/// What the outcome driver did, with per-action results.
#[derive(Debug)]
pub enum OutcomeReport {
    /// No findings: the pull request was approved and merged.
    Clean {
        approve: Option<PostActionError>,
        merge: Option<PostActionError>,
    },
    /// Findings: comments were posted and changes requested.
    ChangesRequested {
        comments: Vec<CommentOutcome>,
        request_changes: Option<PostActionError>,
    },
}

impl OutcomeReport {
    /// One human-readable line for the shell.
    pub fn summary(&self) -> String {
        match self {
            OutcomeReport::Clean { approve, merge } => match (approve, merge) {
                (None, None) => "clean, approved and merged".to_string(),
                (Some(e), _) => format!("clean, but approval failed: {e}"),
                (None, Some(e)) => format!("clean, approved, but merge failed: {e}"),
            },
            OutcomeReport::ChangesRequested {
                comments,
                request_changes,
            } => {
                let failed = comments.iter().filter(|c| c.error.is_some()).count();
                let posted = comments.len() - failed;
                let mut line =
                    format!("changes requested, {posted} comments posted ({failed} failed)");
                if let Some(e) = request_changes {
                    line.push_str(&format!("; request-changes failed: {e}"));
                }
                line
            }
        }
    }
}

/// Drives the terminal action for the run.
///
/// The two branches are mutually exclusive and exhaustive over the emptiness
/// of `reviews`: an empty review set is the clean outcome, anything else
/// requests changes.
pub async fn apply_outcome(
    client: &BitbucketClient,
    pr: PullRequestRef,
    reviews: Vec<ReviewResult>,
    cfg: &PublishConfig,
) -> OutcomeReport {
    if reviews.is_empty() {
        return approve_and_merge(client, pr).await;
    }
    comment_and_request_changes(client, pr, reviews, cfg).await
}

async fn approve_and_merge(client: &BitbucketClient, pr: PullRequestRef) -> OutcomeReport {
    info!("outcome: no findings, approving and merging");

    let approve = client.approve(pr).await.err();
    match &approve {
        None => info!("outcome: pull request approved"),
        Some(e) => error!(error = %e, "outcome: failed to approve pull request"),
    }

    // Independent of approval; a merge failure is reported without retrying
    // the approval.
    let merge = client.merge(pr, MERGE_MESSAGE).await.err();
    match &merge {
        None => info!("outcome: pull request merged"),
        Some(e) => error!(error = %e, "outcome: failed to merge pull request"),
    }

    OutcomeReport::Clean { approve, merge }
}

async fn comment_and_request_changes(
    client: &BitbucketClient,
    pr: PullRequestRef,
    reviews: Vec<ReviewResult>,
    cfg: &PublishConfig,
) -> OutcomeReport {
    info!(
        findings = reviews.len(),
        "outcome: posting review comments"
    );

    let sem = Arc::new(Semaphore::new(cfg.max_concurrency.max(1)));
    let mut tasks = Vec::with_capacity(reviews.len());
    for review in reviews {
        let client = client.clone();
        let sem = sem.clone();
        let path = review.path.clone();
        let handle = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore never closes");
            let error = client
                .post_inline_comment(pr, &review.path, &review.content)
                .await
                .err();
            CommentOutcome {
                path: review.path,
                error,
            }
        });
        tasks.push((path, handle));
    }

    let mut comments = Vec::with_capacity(tasks.len());
    for (path, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => CommentOutcome {
                path,
                error: Some(PostActionError::Network(format!("join error: {e}"))),
            },
        };
        match &outcome.error {
            None => info!(path = %outcome.path, "outcome: comment posted"),
            Some(e) => error!(path = %outcome.path, error = %e, "outcome: failed to post comment"),
        }
        comments.push(outcome);
    }

    let request_changes = client.request_changes(pr).await.err();
    match &request_changes {
        None => info!("outcome: changes requested"),
        Some(e) => error!(error = %e, "outcome: failed to request changes"),
    }

    OutcomeReport::ChangesRequested {
        comments,
        request_changes,
    }
}
