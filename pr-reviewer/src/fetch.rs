//! Change fetcher: diff summary → ignore filtering → concurrent content
//! retrieval.
//!
//! All-or-nothing: a failure fetching metadata, the diffstat, or any single
//! file's content aborts the whole operation. There are no partial results;
//! the asymmetry with best-effort comment posting is deliberate.

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::PullRequestRef;
use crate::errors::RetrievalError;
use crate::ignore::IgnoreFilter;
use crate::provider::{BitbucketClient, DiffstatEntry, SourceFile};

/// A non-ignored changed file scheduled for content retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchTarget {
    pub path: String,
    pub href: String,
}

/// Retrieves the full current content of every non-ignored file changed in
/// the pull request. Per-file fetches run concurrently; completion order is
/// irrelevant and the result carries one entry per target.
pub async fn fetch_modified_source_files(
    client: &BitbucketClient,
    filter: &IgnoreFilter,
    pr: PullRequestRef,
) -> Result<Vec<SourceFile>, RetrievalError> {
    let meta = client.get_pull_request(pr).await?;
    debug!(title = %meta.title, state = %meta.state, "fetch: pull request metadata");

    let diffstat_href = meta
        .diffstat_href()
        .ok_or_else(|| RetrievalError::InvalidResponse("missing diffstat link".into()))?
        .to_string();
    let diffstat = client.get_diffstat(&diffstat_href).await?;

    let targets = select_targets(diffstat.values, filter);
    debug!(files = targets.len(), "fetch: retrieving file contents");

    let tasks: Vec<JoinHandle<Result<SourceFile, RetrievalError>>> = targets
        .into_iter()
        .map(|target| {
            let client = client.clone();
            tokio::spawn(async move {
                let content = client.get_raw(&target.href).await?;
                Ok(SourceFile {
                    path: target.path,
                    content,
                })
            })
        })
        .collect();

    let mut files = Vec::with_capacity(tasks.len());
    for task in tasks {
        let file = task
            .await
            .map_err(|e| RetrievalError::TaskJoin(e.to_string()))??;
        files.push(file);
    }
    Ok(files)
}

/// Applies the ignore filter to the diff summary and keeps only entries with
/// a current (post-change) side.
pub(crate) fn select_targets(
    entries: Vec<DiffstatEntry>,
    filter: &IgnoreFilter,
) -> Vec<FetchTarget> {
    entries
        .into_iter()
        .filter_map(|entry| entry.new_file)
        .filter(|new_file| !filter.is_ignored(&new_file.path))
        .map(|new_file| FetchTarget {
            path: new_file.path,
            href: new_file.links.self_link.href,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChangedFileLinks, ChangedFileRef, Link};

    fn entry(path: &str) -> DiffstatEntry {
        DiffstatEntry {
            new_file: Some(ChangedFileRef {
                path: path.to_string(),
                links: ChangedFileLinks {
                    self_link: Link {
                        href: format!("https://api.example/raw/{path}"),
                    },
                },
            }),
        }
    }

    fn deletion() -> DiffstatEntry {
        DiffstatEntry { new_file: None }
    }

    #[test]
    fn ignored_paths_are_dropped_before_any_fetch() {
        let filter = IgnoreFilter::from_patterns(vec!["vendor/".to_string()]);
        let targets = select_targets(
            vec![entry("src/a.cs"), entry("vendor/lib.cs"), entry("src/b.cs")],
            &filter,
        );
        let paths: Vec<_> = targets.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.cs", "src/b.cs"]);
    }

    #[test]
    fn deletions_have_no_current_content_and_are_skipped() {
        let filter = IgnoreFilter::from_patterns(Vec::new());
        let targets = select_targets(vec![deletion(), entry("src/a.cs")], &filter);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].path, "src/a.cs");
    }

    #[test]
    fn targets_carry_the_content_link_from_the_diffstat() {
        let filter = IgnoreFilter::from_patterns(Vec::new());
        let targets = select_targets(vec![entry("src/a.cs")], &filter);
        assert_eq!(targets[0].href, "https://api.example/raw/src/a.cs");
    }
}
