//! Xiaohongshu (RED) note feed adapter.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use ugci_core::{ContentPost, ContentType, CreatorProfile, MarketRegion, Platform, TimeWindow};

use crate::adapter::{record_items, AdapterSettings, PlatformAdapter};
use crate::error::IngestError;
use crate::hashtags::extract_hashtags;
use crate::http::ApiClient;
use crate::report::IngestReport;

const SEARCH_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteAuthor {
    id: String,
    username: String,
    follower_count: u64,
    avg_engagement_rate: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteItem {
    id: String,
    description: String,
    /// ISO-8601; missing or unparseable falls back to the capture time.
    create_time: Option<String>,
    media_type: Option<String>,
    author: NoteAuthor,
    views: u64,
    likes: u64,
    comments: u64,
    shares: u64,
    saves: u64,
}

/// Reads notes from a Xiaohongshu JSON feed. Every note is from the China market.
///
/// A disabled adapter makes no requests and returns empty reports.
#[derive(Debug)]
pub struct XiaohongshuAdapter {
    api: ApiClient,
    enabled: bool,
}

impl XiaohongshuAdapter {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &AdapterSettings, enabled: bool) -> Result<Self, IngestError> {
        Ok(Self {
            api: ApiClient::new(Platform::Xiaohongshu, settings, None)?,
            enabled,
        })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
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
                record_items(report, Platform::Xiaohongshu, key, items, window, |item| {
                    convert_item(item, now)
                });
            }
            Err(err) => report.skip(Platform::Xiaohongshu, key, err.to_string()),
        }
    }

    fn disabled_report(&self, operation: &str) -> Option<IngestReport> {
        if self.enabled {
            return None;
        }
        tracing::debug!(operation, "xiaohongshu adapter disabled");
        Some(IngestReport::new(Platform::Xiaohongshu))
    }
}

impl PlatformAdapter for XiaohongshuAdapter {
    fn platform(&self) -> Platform {
        Platform::Xiaohongshu
    }

    async fn discover_posts(&self, keywords: &[String], window: &TimeWindow) -> IngestReport {
        if let Some(report) = self.disabled_report("discover_posts") {
            return report;
        }
        let mut report = IngestReport::new(Platform::Xiaohongshu);
        for keyword in keywords {
            let query = [
                ("keyword", keyword.clone()),
                ("page_size", SEARCH_PAGE_SIZE.to_string()),
            ];
            self.fetch_into(&mut report, keyword, "search/notes", &query, Some(window))
                .await;
        }
        tracing::info!(
            keywords = keywords.len(),
            posts = report.posts.len(),
            skipped = report.skipped.len(),
            "xiaohongshu discovery complete"
        );
        report
    }

    async fn monitor_watchlist(&self, creator_ids: &[String]) -> IngestReport {
        if let Some(report) = self.disabled_report("monitor_watchlist") {
            return report;
        }
        let mut report = IngestReport::new(Platform::Xiaohongshu);
        for creator_id in creator_ids {
            let endpoint = format!("user/{creator_id}/notes");
            self.fetch_into(&mut report, creator_id, &endpoint, &[], None)
                .await;
        }
        report
    }

    async fn recapture_posts(&self, post_ids: &[String]) -> IngestReport {
        if let Some(report) = self.disabled_report("recapture_posts") {
            return report;
        }
        let mut report = IngestReport::new(Platform::Xiaohongshu);
        for post_id in post_ids {
            let now = Utc::now();
            match self.api.get_item(&format!("notes/{post_id}")).await {
                Ok(Some(item)) => match convert_item(item, now) {
                    Ok(post) => report.push_post(post.recaptured(now)),
                    Err(err) => {
                        report.skip(Platform::Xiaohongshu, post_id.as_str(), err.to_string());
                    }
                },
                Ok(None) => report.skip(Platform::Xiaohongshu, post_id.as_str(), "note not found"),
                Err(err) => report.skip(Platform::Xiaohongshu, post_id.as_str(), err.to_string()),
            }
        }
        report
    }
}

fn content_type_for(media_type: Option<&str>) -> ContentType {
    match media_type {
        Some("video") => ContentType::Video,
        Some("carousel") => ContentType::Carousel,
        _ => ContentType::Image,
    }
}

/// RFC 3339, or a naive ISO timestamp read as UTC.
fn parse_create_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

pub(crate) fn convert_item(
    value: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<ContentPost, IngestError> {
    let item: NoteItem =
        serde_json::from_value(value).map_err(|source| IngestError::Deserialize {
            context: "xiaohongshu note".to_owned(),
            source,
        })?;

    if item.id.is_empty() {
        return Err(IngestError::conversion("<unknown>", "missing note id"));
    }
    if item.author.id.is_empty() {
        return Err(IngestError::conversion(item.id, "missing author id"));
    }

    let timestamp = match item.create_time.as_deref().map(parse_create_time) {
        Some(Some(parsed)) => parsed,
        Some(None) | None => {
            tracing::debug!(
                note = %item.id,
                create_time = ?item.create_time,
                "unparseable create_time, using capture time"
            );
            now
        }
    };

    let creator = CreatorProfile::new(
        item.author.id,
        item.author.username,
        Platform::Xiaohongshu,
        item.author.follower_count,
        item.author.avg_engagement_rate,
        MarketRegion::China,
    )
    .map_err(|err| IngestError::conversion(item.id.as_str(), err.to_string()))?;

    let hashtags = extract_hashtags(&item.description);
    Ok(ContentPost::new(
        item.id,
        creator,
        content_type_for(item.media_type.as_deref()),
        item.description,
        hashtags,
        timestamp,
        now,
    )
    .with_counts(item.views, item.likes, item.comments, item.shares, item.saves))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn note(create_time: serde_json::Value, media_type: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "n1",
            "description": "秋冬 #护肤 routine #OOTD",
            "create_time": create_time,
            "media_type": media_type,
            "author": {
                "id": "a1",
                "username": "小红",
                "follower_count": 40_000,
                "avg_engagement_rate": 0.05
            },
            "views": 3000, "likes": 210, "comments": 12, "shares": 4, "saves": 90
        })
    }

    #[test]
    fn converts_note() {
        let item = note(json!("2025-04-30T08:00:00Z"), json!("video"));
        let post = convert_item(item, now()).unwrap();
        assert_eq!(post.platform, Platform::Xiaohongshu);
        assert_eq!(post.creator.region, MarketRegion::China);
        assert_eq!(post.content_type, ContentType::Video);
        assert_eq!(post.hashtags, vec!["护肤", "ootd"]);
        assert_eq!(post.timestamp, Utc.with_ymd_and_hms(2025, 4, 30, 8, 0, 0).unwrap());
        assert_eq!(post.saves, 90);
        assert_eq!(post.capture_count, 1);
    }

    #[test]
    fn media_type_mapping() {
        assert_eq!(content_type_for(Some("video")), ContentType::Video);
        assert_eq!(content_type_for(Some("carousel")), ContentType::Carousel);
        assert_eq!(content_type_for(Some("image")), ContentType::Image);
        assert_eq!(content_type_for(Some("live")), ContentType::Image);
        assert_eq!(content_type_for(None), ContentType::Image);
    }

    #[test]
    fn create_time_formats() {
        assert_eq!(
            parse_create_time("2025-04-30T08:00:00+08:00"),
            Some(Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_create_time("2025-04-30T08:00:00"),
            Some(Utc.with_ymd_and_hms(2025, 4, 30, 8, 0, 0).unwrap())
        );
        assert_eq!(parse_create_time("yesterday"), None);
    }

    #[test]
    fn bad_or_missing_create_time_falls_back_to_now() {
        let post = convert_item(note(json!("yesterday"), json!("image")), now()).unwrap();
        assert_eq!(post.timestamp, now());
        let post = convert_item(note(json!(null), json!(null)), now()).unwrap();
        assert_eq!(post.timestamp, now());
        assert_eq!(post.content_type, ContentType::Image);
    }
}
