//! TikTok research API adapter.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ugci_core::{ContentPost, ContentType, CreatorProfile, MarketRegion, Platform, TimeWindow};

use crate::adapter::{record_items, AdapterSettings, PlatformAdapter};
use crate::error::IngestError;
use crate::hashtags::extract_hashtags;
use crate::http::ApiClient;
use crate::report::IngestReport;

const DISCOVER_PAGE_SIZE: u32 = 100;
const WATCHLIST_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TikTokAuthor {
    id: String,
    username: String,
    follower_count: u64,
    avg_engagement_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TikTokStatistics {
    play_count: u64,
    digg_count: u64,
    comment_count: u64,
    share_count: u64,
    collect_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TikTokItem {
    id: String,
    description: String,
    /// Unix seconds.
    create_time: i64,
    author: TikTokAuthor,
    statistics: TikTokStatistics,
}

/// Reads posts from the TikTok JSON API. Every post is a video from the US market.
#[derive(Debug)]
pub struct TikTokAdapter {
    api: ApiClient,
}

impl TikTokAdapter {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &AdapterSettings, api_key: Option<String>) -> Result<Self, IngestError> {
        Ok(Self {
            api: ApiClient::new(Platform::Tiktok, settings, api_key)?,
        })
    }

    async fn fetch_into(
        &self,
        report: &mut IngestReport,
        key: &str,
        endpoint: &str,
        query: &[(&str, String)],
        window: Option<&TimeWindow>,
    ) {
        match self.api.get_list(endpoint, query).await {
            Ok(items) => {
                let now = Utc::now();
                record_items(report, Platform::Tiktok, key, items, window, |item| {
                    convert_item(item, now)
                });
            }
            Err(err) => report.skip(Platform::Tiktok, key, err.to_string()),
        }
    }
}

impl PlatformAdapter for TikTokAdapter {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    async fn discover_posts(&self, keywords: &[String], window: &TimeWindow) -> IngestReport {
        let mut report = IngestReport::new(Platform::Tiktok);
        for keyword in keywords {
            let query = [
                ("hashtag", keyword.clone()),
                ("count", DISCOVER_PAGE_SIZE.to_string()),
            ];
            self.fetch_into(&mut report, keyword, "hashtag/posts", &query, Some(window))
                .await;
        }
        tracing::info!(
            keywords = keywords.len(),
            posts = report.posts.len(),
            skipped = report.skipped.len(),
            "tiktok discovery complete"
        );
        report
    }

    async fn monitor_watchlist(&self, creator_ids: &[String]) -> IngestReport {
        let mut report = IngestReport::new(Platform::Tiktok);
        for creator_id in creator_ids {
            let endpoint = format!("user/{creator_id}/posts");
            let query = [("count", WATCHLIST_PAGE_SIZE.to_string())];
            self.fetch_into(&mut report, creator_id, &endpoint, &query, None)
                .await;
        }
        report
    }

    async fn recapture_posts(&self, post_ids: &[String]) -> IngestReport {
        let mut report = IngestReport::new(Platform::Tiktok);
        for post_id in post_ids {
            let now = Utc::now();
            match self.api.get_item(&format!("post/{post_id}")).await {
                Ok(Some(item)) => match convert_item(item, now) {
                    Ok(post) => report.push_post(post.recaptured(now)),
                    Err(err) => report.skip(Platform::Tiktok, post_id.as_str(), err.to_string()),
                },
                Ok(None) => report.skip(Platform::Tiktok, post_id.as_str(), "post not found"),
                Err(err) => report.skip(Platform::Tiktok, post_id.as_str(), err.to_string()),
            }
        }
        report
    }
}

/// Map one raw API item onto the data model, first seen at `now`.
pub(crate) fn convert_item(
    value: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<ContentPost, IngestError> {
    let item: TikTokItem =
        serde_json::from_value(value).map_err(|source| IngestError::Deserialize {
            context: "tiktok post".to_owned(),
            source,
        })?;

    if item.id.is_empty() {
        return Err(IngestError::conversion("<unknown>", "missing post id"));
    }
    if item.author.id.is_empty() {
        return Err(IngestError::conversion(item.id, "missing author id"));
    }

    let timestamp = DateTime::from_timestamp(item.create_time, 0).ok_or_else(|| {
        IngestError::conversion(
            item.id.as_str(),
            format!("create_time {} is out of range", item.create_time),
        )
    })?;

    let creator = CreatorProfile::new(
        item.author.id,
        item.author.username,
        Platform::Tiktok,
        item.author.follower_count,
        item.author.avg_engagement_rate,
        MarketRegion::Us,
    )
    .map_err(|err| IngestError::conversion(item.id.as_str(), err.to_string()))?;

    let hashtags = extract_hashtags(&item.description);
    let stats = item.statistics;
    Ok(ContentPost::new(
        item.id,
        creator,
        ContentType::Video,
        item.description,
        hashtags,
        timestamp,
        now,
    )
    .with_counts(
        stats.play_count,
        stats.digg_count,
        stats.comment_count,
        stats.share_count,
        stats.collect_count,
    ))
}
