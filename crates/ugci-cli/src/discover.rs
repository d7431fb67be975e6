//! Offline discovery: posts from a JSON file in, pipeline report out.
//!
//! Nothing here touches the network or the database, which makes it the
//! quickest way to try threshold changes against a captured batch.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use ugci_core::{ContentPost, DiscoveryConfig, WindowKind, WindowManager};
use ugci_trends::{DiscoveryPipeline, DiscoveryReport};

#[derive(Debug)]
pub(crate) struct DiscoverArgs {
    pub input: PathBuf,
    pub window: Option<WindowKind>,
    pub min_confidence: f64,
    pub config: PathBuf,
    pub now: DateTime<Utc>,
}

/// Read posts, run the pipeline and print the report as pretty JSON.
///
/// # Errors
///
/// Returns an error if the input or config cannot be read or parsed, or the
/// pipeline rejects the batch.
pub(crate) fn run_discover(args: &DiscoverArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let posts = parse_posts(&raw)?;
    let config = ugci_core::load_discovery_config(&args.config)?;

    let report = discover(posts, &config, args.window, args.min_confidence, args.now)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) fn parse_posts(raw: &str) -> anyhow::Result<Vec<ContentPost>> {
    serde_json::from_str(raw).context("input must be a JSON array of posts")
}

/// Optionally narrow `posts` to a window ending at `now`, then run one cycle.
pub(crate) fn discover(
    posts: Vec<ContentPost>,
    config: &DiscoveryConfig,
    window: Option<WindowKind>,
    min_confidence: f64,
    now: DateTime<Utc>,
) -> anyhow::Result<DiscoveryReport> {
    let posts = match window {
        Some(kind) => {
            let manager = WindowManager::new(config.windows.clone());
            let window = manager.create_window(kind, now)?;
            manager.filter_posts_in_window(&posts, &window)
        }
        None => posts,
    };

    let outcome = DiscoveryPipeline::new(config).run(&posts, min_confidence, now)?;
    Ok(outcome.report())
}
