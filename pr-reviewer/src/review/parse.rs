//! Parsing of the model reply into per-file review sections.
//!
//! The reply contract is heading-delimited free text: a section opens with a
//! literal `## File: <path>` line and runs until the next heading or the end
//! of the reply. Zero headings is the normal clean outcome, not an error.

use lazy_static::lazy_static;
use regex::Regex;

use super::ReviewResult;

lazy_static! {
    /// Section heading at line start. Depends on the output format defined in
    /// `prompt::REVIEW_INSTRUCTIONS`; keep the two in lock-step.
    static ref FILE_HEADING: Regex =
        Regex::new(r"(?m)^## File: (.+)$").expect("heading regex is valid");
}

/// Extracts one [`ReviewResult`] per `## File:` heading, preserving the order
/// the headings occur in the reply. Section bodies are trimmed of leading and
/// trailing whitespace.
pub fn parse_review_reply(reply: &str) -> Vec<ReviewResult> {
    let headings: Vec<(String, usize, usize)> = FILE_HEADING
        .captures_iter(reply)
        .map(|caps| {
            let whole = caps.get(0).expect("group 0 always present");
            let path = caps
                .get(1)
                .expect("heading regex has one capture group")
                .as_str()
                .trim()
                .to_string();
            (path, whole.start(), whole.end())
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(i, (path, _, body_start))| {
            let body_end = headings
                .get(i + 1)
                .map(|(_, next_start, _)| *next_start)
                .unwrap_or(reply.len());
            ReviewResult {
                path: path.clone(),
                content: reply[*body_start..body_end].trim().to_string(),
            }
        })
        .collect()
}
