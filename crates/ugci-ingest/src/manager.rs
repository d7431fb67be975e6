//! Fan-out over the configured platform adapters.

use std::collections::{BTreeMap, BTreeSet};

use ugci_core::{AppConfig, Platform, TimeWindow};

use crate::adapter::{AdapterSettings, PlatformAdapter};
use crate::error::IngestError;
use crate::report::IngestReport;
use crate::tiktok::TikTokAdapter;
use crate::xiaohongshu::XiaohongshuAdapter;

/// The concrete adapters the manager can own.
#[derive(Debug)]
pub enum Adapter {
    TikTok(TikTokAdapter),
    Xiaohongshu(XiaohongshuAdapter),
}

impl PlatformAdapter for Adapter {
    fn platform(&self) -> Platform {
        match self {
            Self::TikTok(adapter) => adapter.platform(),
            Self::Xiaohongshu(adapter) => adapter.platform(),
        }
    }

    async fn discover_posts(&self, keywords: &[String], window: &TimeWindow) -> IngestReport {
        match self {
            Self::TikTok(adapter) => adapter.discover_posts(keywords, window).await,
            Self::Xiaohongshu(adapter) => adapter.discover_posts(keywords, window).await,
        }
    }

    async fn monitor_watchlist(&self, creator_ids: &[String]) -> IngestReport {
        match self {
            Self::TikTok(adapter) => adapter.monitor_watchlist(creator_ids).await,
            Self::Xiaohongshu(adapter) => adapter.monitor_watchlist(creator_ids).await,
        }
    }

    async fn recapture_posts(&self, post_ids: &[String]) -> IngestReport {
        match self {
            Self::TikTok(adapter) => adapter.recapture_posts(post_ids).await,
            Self::Xiaohongshu(adapter) => adapter.recapture_posts(post_ids).await,
        }
    }
}

impl From<TikTokAdapter> for Adapter {
    fn from(adapter: TikTokAdapter) -> Self {
        Self::TikTok(adapter)
    }
}

impl From<XiaohongshuAdapter> for Adapter {
    fn from(adapter: XiaohongshuAdapter) -> Self {
        Self::Xiaohongshu(adapter)
    }
}

/// Routes ingestion calls to one adapter per platform.
#[derive(Debug, Default)]
pub struct IngestionManager {
    adapters: BTreeMap<Platform, Adapter>,
}

impl IngestionManager {
    /// TikTok and Xiaohongshu adapters configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, IngestError> {
        let tiktok = TikTokAdapter::new(
            &AdapterSettings::tiktok(config),
            config.tiktok_api_key.clone(),
        )?;
        let xiaohongshu = XiaohongshuAdapter::new(
            &AdapterSettings::xiaohongshu(config),
            config.xiaohongshu_enabled,
        )?;
        if config.tiktok_api_key.is_none() {
            tracing::warn!("TIKTOK_API_KEY not set; tiktok requests are unauthenticated");
        }
        Ok(Self::with_adapters([Adapter::from(tiktok), Adapter::from(xiaohongshu)]))
    }

    /// A later adapter for the same platform replaces an earlier one.
    #[must_use]
    pub fn with_adapters(adapters: impl IntoIterator<Item = Adapter>) -> Self {
        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.platform(), adapter))
                .collect(),
        }
    }

    #[must_use]
    pub fn adapter(&self, platform: Platform) -> Option<&Adapter> {
        self.adapters.get(&platform)
    }

    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.adapters.keys().copied()
    }

    /// Discover on every requested platform concurrently and merge the results.
    ///
    /// Platforms without an adapter contribute an empty report.
    pub async fn discover_posts(
        &self,
        platforms: &[Platform],
        keywords: &[String],
        window: &TimeWindow,
    ) -> IngestReport {
        let requested: BTreeSet<Platform> = platforms.iter().copied().collect();
        let runs = requested.into_iter().map(|platform| async move {
            match self.adapters.get(&platform) {
                Some(adapter) => adapter.discover_posts(keywords, window).await,
                None => {
                    tracing::warn!(%platform, "no adapter configured; skipping platform");
                    IngestReport::new(platform)
                }
            }
        });
        let report = IngestReport::merged(futures::future::join_all(runs).await);
        tracing::info!(
            platforms = platforms.len(),
            keywords = keywords.len(),
            posts = report.posts.len(),
            skipped = report.skipped.len(),
            "ingestion discovery complete"
        );
        report
    }

    pub async fn monitor_watchlist(
        &self,
        platform: Platform,
        creator_ids: &[String],
    ) -> IngestReport {
        match self.adapters.get(&platform) {
            Some(adapter) => adapter.monitor_watchlist(creator_ids).await,
            None => IngestReport::new(platform),
        }
    }

    pub async fn recapture_posts(&self, platform: Platform, post_ids: &[String]) -> IngestReport {
        match self.adapters.get(&platform) {
            Some(adapter) => adapter.recapture_posts(post_ids).await,
            None => IngestReport::new(platform),
        }
    }
}
