//! Pull-request review pipeline.
//!
//! Single high-level function to run the whole review for one pull request:
//!
//! 1) **Step 1 — Fetch**
//!    - Pull-request metadata → diff-summary link → changed-file entries
//!    - Ignore filtering before any content retrieval
//!    - Concurrent per-file content fetch, all-or-nothing
//!
//! 2) **Step 2 — Review**
//!    - One batched chat completion (system policy + concatenated files)
//!    - Reply parsed into `## File:` sections, one result per section
//!
//! 3) **Step 3 — Outcome**
//!    - Empty review set → approve and merge
//!    - Findings → inline comments (best-effort fan-out) + request changes
//!
//! The pipeline uses `tracing` for step logging and avoids `async-trait` and
//! heap trait objects; thin concrete clients are injected at construction.

pub mod config;
pub mod errors;
pub mod fetch;
pub mod ignore;
pub mod provider;
pub mod publish;
pub mod review;

use std::time::Instant;

use llm_service::ChatCompletionService;
use tracing::debug;

use config::AppConfig;
use errors::PrResult;
use ignore::IgnoreFilter;
use provider::BitbucketClient;
use publish::{OutcomeReport, PublishConfig};

pub use review::ReviewResult;

/// Runs fetch → review → outcome for one pull request and returns the
/// outcome report.
///
/// Any [`errors::RetrievalError`] or [`errors::ReviewProviderError`] aborts
/// before the pull request is mutated in any way; per-action failures inside
/// the outcome step are carried in the report instead.
pub async fn run_review(
    cfg: &AppConfig,
    llm: &ChatCompletionService,
    publish_cfg: PublishConfig,
) -> PrResult<OutcomeReport> {
    let t0 = Instant::now();

    let filter = IgnoreFilter::from_file(&cfg.ignore_file);
    let client = BitbucketClient::from_config(&cfg.provider)?;
    debug!("step1: provider client ready");

    let files = fetch::fetch_modified_source_files(&client, &filter, cfg.pull_request).await?;
    debug!(
        files = files.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "step1: changed files fetched"
    );

    let reviews = review::review_files(llm, &files).await?;
    debug!(
        findings = reviews.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "step2: model review complete"
    );

    let report = publish::apply_outcome(&client, cfg.pull_request, reviews, &publish_cfg).await;
    debug!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "step3: outcome applied"
    );

    Ok(report)
}
