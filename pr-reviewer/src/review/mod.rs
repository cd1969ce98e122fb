//! Review requester: one batched model call per run, parsed into per-file
//! results.

pub mod parse;
pub mod prompt;

use llm_service::ChatCompletionService;
use tracing::{debug, info};

use crate::errors::ReviewProviderError;
use crate::provider::SourceFile;

/// Model-authored review for one file: issues, suggestions, improved code.
/// Same shape as a source file, with the content holding review text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewResult {
    pub path: String,
    pub content: String,
}

/// Submits every fetched file in a single request and parses the reply into
/// per-file sections. An empty result means the pull request is clean.
///
/// At most one model call per invocation; an empty input batch short-circuits
/// without calling the model at all.
///
/// # Errors
/// Returns [`ReviewProviderError`] when the completion call itself fails. A
/// reply with zero sections is a success.
pub async fn review_files(
    llm: &ChatCompletionService,
    files: &[SourceFile],
) -> Result<Vec<ReviewResult>, ReviewProviderError> {
    if files.is_empty() {
        debug!("review: no files to review, skipping model call");
        return Ok(Vec::new());
    }

    let body = prompt::render_request_body(files);
    debug!(
        files = files.len(),
        body_len = body.len(),
        model = %llm.model(),
        "review: sending batch to model"
    );

    let reply = llm.complete(prompt::REVIEW_INSTRUCTIONS, &body).await?;

    let results = parse::parse_review_reply(&reply);
    info!(
        files = files.len(),
        findings = results.len(),
        "review: parsed model reply"
    );
    Ok(results)
}
