use std::collections::HashSet;

use serde::Serialize;
use ugci_core::{ContentPost, Platform};

/// A request or item that produced no post, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub platform: Platform,
    /// Keyword, creator id, post id or `source[index]` for anonymous items.
    pub key: String,
    pub reason: String,
}

/// Outcome of one adapter call, or several merged together.
///
/// `platform` is `None` once reports from different platforms are merged.
/// Post ids are unique within a report; repeats are recorded as skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub platform: Option<Platform>,
    pub posts: Vec<ContentPost>,
    pub skipped: Vec<SkippedItem>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl IngestReport {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform: Some(platform),
            ..Self::default()
        }
    }

    pub fn push_post(&mut self, post: ContentPost) {
        if self.seen.insert(post.post_id.clone()) {
            self.posts.push(post);
        } else {
            let platform = post.platform;
            self.skip(platform, post.post_id, "duplicate post id");
        }
    }

    pub fn skip(&mut self, platform: Platform, key: impl Into<String>, reason: impl Into<String>) {
        let item = SkippedItem {
            platform,
            key: key.into(),
            reason: reason.into(),
        };
        tracing::warn!(
            platform = %item.platform,
            key = %item.key,
            reason = %item.reason,
            "ingest item skipped"
        );
        self.skipped.push(item);
    }

    /// Fold `other` into `self`, keeping the first copy of any repeated post.
    pub fn merge(&mut self, other: IngestReport) {
        self.platform = match (self.platform, other.platform) {
            (ours, theirs) if ours == theirs => ours,
            (None, theirs) if self.is_blank() => theirs,
            (ours, None) if other.is_blank() => ours,
            _ => None,
        };
        self.skipped.extend(other.skipped);
        for post in other.posts {
            self.push_post(post);
        }
    }

    #[must_use]
    pub fn merged(reports: impl IntoIterator<Item = IngestReport>) -> Self {
        reports.into_iter().fold(Self::default(), |mut acc, report| {
            acc.merge(report);
            acc
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.posts.is_empty() && self.skipped.is_empty()
    }
}
