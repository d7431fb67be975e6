//! Proof tiles: the evidence card shown for a trend.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{
    ContentPost, ContentType, CreatorTier, MarketRegion, Platform, ProofSettings, TrendStatus,
    UrgencyLevel,
};

use crate::metrics;
use crate::trend::TrendSignal;

pub const RECOMMEND_ACT_NOW: &str = "act now: create content within 48h";
pub const RECOMMEND_PREPARE: &str = "prepare: develop concepts";
pub const RECOMMEND_MONITOR: &str = "monitor: continue tracking";

const MAX_EXAMPLE_POSTS: usize = 5;
const MAX_CREATOR_SAMPLES: usize = 5;
const MAX_SUGGESTED_HASHTAGS: usize = 5;
const HEADLINE_HASHTAGS: usize = 3;
const CAPTION_PREVIEW_CHARS: usize = 200;

/// The ten headline numbers on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TileMetrics {
    pub total_engagement: f64,
    pub growth_rate_24h: f64,
    pub saturation_estimate: f64,
    pub creator_replication: f64,
    pub detection_confidence: f64,
    pub validation_confidence: f64,
    pub cluster_health: f64,
    pub creator_diversity: f64,
    pub engagement_strength: f64,
    pub velocity_score: f64,
}

impl TileMetrics {
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_engagement", self.total_engagement),
            ("growth_rate_24h", self.growth_rate_24h),
            ("saturation_estimate", self.saturation_estimate),
            ("creator_replication", self.creator_replication),
            ("detection_confidence", self.detection_confidence),
            ("validation_confidence", self.validation_confidence),
            ("cluster_health", self.cluster_health),
            ("creator_diversity", self.creator_diversity),
            ("engagement_strength", self.engagement_strength),
            ("velocity_score", self.velocity_score),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub hashtags: Vec<String>,
    pub formats: Vec<ContentType>,
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePost {
    pub post_id: String,
    pub platform: Platform,
    pub caption: String,
    pub hashtags: Vec<String>,
    /// Total engagement, saves included.
    pub engagement: u64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<&ContentPost> for ExamplePost {
    fn from(post: &ContentPost) -> Self {
        Self {
            post_id: post.post_id.clone(),
            platform: post.platform,
            caption: post.caption.chars().take(CAPTION_PREVIEW_CHARS).collect(),
            hashtags: post.hashtags.clone(),
            engagement: post.total_engagement(),
            views: post.views,
            likes: post.likes,
            comments: post.comments,
            shares: post.shares,
            timestamp: post.timestamp,
        }
    }
}

/// One creator's contribution to a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorSample {
    pub creator_id: String,
    pub username: String,
    pub platform: Platform,
    pub follower_count: u64,
    pub tier: CreatorTier,
    pub region: MarketRegion,
    pub post_count: usize,
    pub total_engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofTile {
    pub tile_id: String,
    pub trend_id: String,
    pub headline: String,
    pub urgency: UrgencyLevel,
    pub recommendation: String,
    /// Signal status when the tile was generated.
    pub status: TrendStatus,
    pub metrics: TileMetrics,
    pub suggested_action: SuggestedAction,
    pub example_posts: Vec<ExamplePost>,
    pub creator_samples: Vec<CreatorSample>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProofTileGenerator {
    settings: ProofSettings,
}

impl ProofTileGenerator {
    #[must_use]
    pub fn new(settings: ProofSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn generate(&self, signal: &TrendSignal) -> ProofTile {
        self.generate_at(signal, Utc::now())
    }

    /// Build the tile for `signal` as of `now`.
    #[must_use]
    pub fn generate_at(&self, signal: &TrendSignal, now: DateTime<Utc>) -> ProofTile {
        let confidence = signal.validation_confidence();
        let (urgency, recommendation) = self.urgency(signal.status(), confidence);

        ProofTile {
            tile_id: format!("tile_{}", signal.signal_id()),
            trend_id: signal.signal_id().to_string(),
            headline: headline(signal),
            urgency,
            recommendation: recommendation.to_string(),
            status: signal.status(),
            metrics: tile_metrics(signal, now),
            suggested_action: suggested_action(signal),
            example_posts: example_posts(signal.cluster().posts()),
            creator_samples: creator_samples(signal.cluster().posts()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Map status and validation confidence to urgency and advice.
    #[must_use]
    pub fn urgency(&self, status: TrendStatus, confidence: f64) -> (UrgencyLevel, &'static str) {
        match status {
            TrendStatus::Validated if confidence >= self.settings.urgency_threshold => {
                (UrgencyLevel::High, RECOMMEND_ACT_NOW)
            }
            TrendStatus::Validated | TrendStatus::Validating => {
                (UrgencyLevel::Medium, RECOMMEND_PREPARE)
            }
            TrendStatus::Emerging | TrendStatus::Saturated | TrendStatus::Declining => {
                (UrgencyLevel::Low, RECOMMEND_MONITOR)
            }
        }
    }
}

fn headline(signal: &TrendSignal) -> String {
    let tags: Vec<&str> = signal
        .primary_hashtags()
        .iter()
        .take(HEADLINE_HASHTAGS)
        .map(String::as_str)
        .collect();
    format!(
        "emerging trend: {} - {} creators, {} posts",
        tags.join(", "),
        signal.creator_replication_count(),
        signal.post_count()
    )
}

#[allow(clippy::cast_precision_loss)]
fn tile_metrics(signal: &TrendSignal, now: DateTime<Utc>) -> TileMetrics {
    let cluster = signal.cluster();
    let posts = cluster.posts();
    let health = cluster.health();

    let total_engagement: u64 = posts.iter().map(ContentPost::total_engagement).sum();
    let growth_rate_24h = metrics::mean_velocity_at(posts, now) * 24.0;

    let hours_active = (now - signal.first_detected()).num_seconds() as f64 / 3600.0;
    let days_active = (hours_active / 24.0).max(1.0);

    TileMetrics {
        total_engagement: total_engagement as f64,
        growth_rate_24h,
        saturation_estimate: metrics::saturation_level(posts, days_active),
        creator_replication: signal.creator_replication_count() as f64,
        detection_confidence: signal.detection_confidence(),
        validation_confidence: signal.validation_confidence(),
        cluster_health: health.health_score,
        creator_diversity: health.creator_diversity,
        engagement_strength: health.engagement_strength,
        velocity_score: health.velocity_score,
    }
}

fn suggested_action(signal: &TrendSignal) -> SuggestedAction {
    let formats: BTreeSet<ContentType> = signal
        .cluster()
        .posts()
        .iter()
        .map(|post| post.content_type)
        .collect();

    SuggestedAction {
        hashtags: signal
            .primary_hashtags()
            .iter()
            .take(MAX_SUGGESTED_HASHTAGS)
            .cloned()
            .collect(),
        formats: formats.into_iter().collect(),
        platforms: signal.platforms().into_iter().collect(),
    }
}

/// Highest total engagement first; ties keep cluster order.
fn example_posts(posts: &[ContentPost]) -> Vec<ExamplePost> {
    let mut ranked: Vec<&ContentPost> = posts.iter().collect();
    ranked.sort_by(|a, b| b.total_engagement().cmp(&a.total_engagement()));
    ranked
        .into_iter()
        .take(MAX_EXAMPLE_POSTS)
        .map(ExamplePost::from)
        .collect()
}

/// Per-creator totals, profile fields from the creator's first post.
fn creator_samples(posts: &[ContentPost]) -> Vec<CreatorSample> {
    let mut order: Vec<CreatorSample> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for post in posts {
        let creator = &post.creator;
        match position.get(creator.creator_id.as_str()) {
            Some(&at) => {
                let sample = &mut order[at];
                sample.post_count += 1;
                sample.total_engagement =
                    sample.total_engagement.saturating_add(post.total_engagement());
            }
            None => {
                position.insert(creator.creator_id.as_str(), order.len());
                order.push(CreatorSample {
                    creator_id: creator.creator_id.clone(),
                    username: creator.username.clone(),
                    platform: creator.platform,
                    follower_count: creator.follower_count,
                    tier: creator.tier(),
                    region: creator.region,
                    post_count: 1,
                    total_engagement: post.total_engagement(),
                });
            }
        }
    }

    order.sort_by(|a, b| b.total_engagement.cmp(&a.total_engagement));
    order.truncate(MAX_CREATOR_SAMPLES);
    order
}

#[cfg(test)]
#[path = "proof_tile_test.rs"]
mod tests;
