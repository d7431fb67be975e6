use ugci_core::{AppConfig, ContentPost, Platform, TimeWindow};

use crate::error::IngestError;
use crate::report::IngestReport;

/// What every platform integration can do.
///
/// Methods never fail as a whole: a failed request or an unconvertible item
/// becomes a [`crate::SkippedItem`] in the returned report.
#[allow(async_fn_in_trait)]
pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    /// Posts matching any of `keywords` that were published inside `window`.
    async fn discover_posts(&self, keywords: &[String], window: &TimeWindow) -> IngestReport;

    /// Recent posts from each creator in `creator_ids`.
    async fn monitor_watchlist(&self, creator_ids: &[String]) -> IngestReport;

    /// Fresh counters for already-known posts, with `capture_count` bumped.
    async fn recapture_posts(&self, post_ids: &[String]) -> IngestReport;
}

/// Connection settings shared by the HTTP adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Zero disables pacing.
    pub requests_per_minute: u32,
}

impl AdapterSettings {
    #[must_use]
    pub fn tiktok(config: &AppConfig) -> Self {
        Self {
            base_url: config.tiktok_base_url.clone(),
            timeout_secs: config.ingest_request_timeout_secs,
            max_retries: config.ingest_max_retries,
            backoff_base_ms: config.ingest_retry_backoff_base_ms,
            requests_per_minute: config.tiktok_rate_limit,
        }
    }

    #[must_use]
    pub fn xiaohongshu(config: &AppConfig) -> Self {
        Self {
            base_url: config.xiaohongshu_base_url.clone(),
            timeout_secs: config.ingest_request_timeout_secs,
            max_retries: config.ingest_max_retries,
            backoff_base_ms: config.ingest_retry_backoff_base_ms,
            requests_per_minute: config.xiaohongshu_rate_limit,
        }
    }

    /// Unpaced, no-retry settings pointed at `base_url`.
    #[must_use]
    pub fn local(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 0,
            requests_per_minute: 0,
        }
    }
}

/// Convert each raw item from `source` and record it in `report`.
///
/// Items that fail conversion, or fall outside `window` when one is given,
/// are recorded as skipped.
pub(crate) fn record_items<F>(
    report: &mut IngestReport,
    platform: Platform,
    source: &str,
    items: Vec<serde_json::Value>,
    window: Option<&TimeWindow>,
    mut convert: F,
) where
    F: FnMut(serde_json::Value) -> Result<ContentPost, IngestError>,
{
    let total = items.len();
    for (index, item) in items.into_iter().enumerate() {
        let key = item_key(&item).unwrap_or_else(|| format!("{source}[{index}]"));
        match convert(item) {
            Ok(post) => match window {
                Some(window) if !window.contains(post.timestamp) => report.skip(
                    platform,
                    key,
                    format!(
                        "published {} outside the {} window",
                        post.timestamp.to_rfc3339(),
                        window.kind
                    ),
                ),
                _ => report.push_post(post),
            },
            Err(err) => report.skip(platform, key, err.to_string()),
        }
    }
    tracing::debug!(%platform, source, total, "recorded items");
}

/// The item's `id` field, when it is a non-empty string or a number.
fn item_key(item: &serde_json::Value) -> Option<String> {
    match item.get("id")? {
        serde_json::Value::String(id) if !id.is_empty() => Some(id.clone()),
        serde_json::Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
