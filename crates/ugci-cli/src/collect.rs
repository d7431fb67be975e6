//! Collection command handlers for the CLI.
//!
//! Adapters never fail a whole run: items that could not be fetched or
//! converted come back as skips and are printed alongside the totals.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use ugci_core::{AppConfig, Platform, WindowKind, WindowManager};
use ugci_ingest::{IngestReport, IngestionManager, SkippedItem};

/// What a collect, recapture or watch run produced.
#[derive(Debug, Serialize)]
pub(crate) struct CollectSummary<'a> {
    pub platform: Option<Platform>,
    pub fetched: usize,
    /// `None` on a dry run.
    pub inserted: Option<u64>,
    pub skipped: &'a [SkippedItem],
}

pub(crate) fn summarize(report: &IngestReport, inserted: Option<u64>) -> CollectSummary<'_> {
    CollectSummary {
        platform: report.platform,
        fetched: report.posts.len(),
        inserted,
        skipped: &report.skipped,
    }
}

pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = ugci_db::PoolConfig::from_app_config(config);
    let pool = ugci_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

/// Store the report's posts unless `dry_run`, then print the summary.
async fn store_and_print(
    config: &AppConfig,
    report: &IngestReport,
    dry_run: bool,
) -> anyhow::Result<()> {
    let inserted = if dry_run {
        tracing::info!(posts = report.posts.len(), "dry run; nothing written");
        None
    } else if report.posts.is_empty() {
        Some(0)
    } else {
        let pool = connect(config).await?;
        Some(ugci_db::upsert_posts(&pool, &report.posts).await?)
    };

    println!("{}", serde_json::to_string_pretty(&summarize(report, inserted))?);
    Ok(())
}

/// Search `platforms` for `keywords` inside the configured `window_kind`.
///
/// # Errors
///
/// Returns an error if the discovery config or HTTP clients cannot be built,
/// or storing the posts fails.
pub(crate) async fn run_collect(
    config: &AppConfig,
    platforms: &[Platform],
    keywords: &[String],
    window_kind: WindowKind,
    dry_run: bool,
) -> anyhow::Result<()> {
    let discovery = ugci_core::load_discovery_config(&config.discovery_config_path)?;
    let window = WindowManager::new(discovery.windows).create_window(window_kind, Utc::now())?;
    let manager = IngestionManager::from_config(config)?;

    tracing::info!(
        platforms = platforms.len(),
        keywords = keywords.len(),
        window = %window_kind,
        dry_run,
        "starting collection"
    );
    let report = manager.discover_posts(platforms, keywords, &window).await;
    store_and_print(config, &report, dry_run).await
}

/// Re-fetch known posts so their counters and capture count advance.
///
/// # Errors
///
/// Returns an error if the HTTP clients cannot be built or storing fails.
pub(crate) async fn run_recapture(
    config: &AppConfig,
    platform: Platform,
    post_ids: &[String],
    dry_run: bool,
) -> anyhow::Result<()> {
    let manager = IngestionManager::from_config(config)?;
    let report = manager.recapture_posts(platform, post_ids).await;
    store_and_print(config, &report, dry_run).await
}

/// Pull the latest posts of each watched creator.
///
/// # Errors
///
/// Returns an error if the HTTP clients cannot be built or storing fails.
pub(crate) async fn run_watch(
    config: &AppConfig,
    platform: Platform,
    creator_ids: &[String],
    dry_run: bool,
) -> anyhow::Result<()> {
    let manager = IngestionManager::from_config(config)?;
    let report = manager.monitor_watchlist(platform, creator_ids).await;
    store_and_print(config, &report, dry_run).await
}
