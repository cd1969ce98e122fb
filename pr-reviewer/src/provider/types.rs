//! Data model for pull-request content and the provider wire subset we use.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A file's full text at the pull request head. Immutable once constructed;
/// fetched fresh per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// --- Bitbucket response shapes (subset of fields we actually use) ---

/// Pull-request metadata. The `links` map is the only part the pipeline
/// depends on; title/state feed the logs.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestMeta {
    pub title: String,
    pub state: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub links: HashMap<String, Link>,
}

impl PullRequestMeta {
    /// Address of the diff-summary resource, when the provider exposed one.
    pub fn diffstat_href(&self) -> Option<&str> {
        self.links.get("diffstat").map(|l| l.href.as_str())
    }
}

/// A named link inside a provider resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Diff summary: one entry per changed file.
#[derive(Debug, Clone, Deserialize)]
pub struct Diffstat {
    pub values: Vec<DiffstatEntry>,
}

/// One changed file. `new` is absent for pure deletions, which have no
/// current content to review.
#[derive(Debug, Clone, Deserialize)]
pub struct DiffstatEntry {
    #[serde(rename = "new", default)]
    pub new_file: Option<ChangedFileRef>,
}

/// The post-change side of a diffstat entry: path plus content link.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFileRef {
    pub path: String,
    pub links: ChangedFileLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangedFileLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}
