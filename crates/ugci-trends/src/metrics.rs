//! Transparent scoring functions.
//!
//! Every function here is total: an empty input or a zero denominator yields
//! `0.0` instead of an error.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{ClusteringSettings, ContentPost};

/// Engagements/hour treated as "maximally fast" when normalizing velocity.
pub const DEFAULT_MAX_VELOCITY: f64 = 1000.0;

/// Relative weight of each component of cluster health.
///
/// Weights are not required to sum to 1.0; the blended score is capped at
/// 1.0 either way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    pub diversity: f64,
    pub engagement: f64,
    pub velocity: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            diversity: 0.4,
            engagement: 0.3,
            velocity: 0.3,
        }
    }
}

impl From<&ClusteringSettings> for HealthWeights {
    fn from(settings: &ClusteringSettings) -> Self {
        Self {
            diversity: settings.creator_diversity_weight,
            engagement: settings.engagement_strength_weight,
            velocity: settings.velocity_weight,
        }
    }
}

/// `(likes + comments + shares) / views`, `0.0` without views.
#[must_use]
pub fn engagement_rate(post: &ContentPost) -> f64 {
    post.engagement_rate()
}

#[must_use]
pub fn velocity_score(post: &ContentPost) -> f64 {
    velocity_score_at(post, Utc::now())
}

/// Engagements per hour since the post was first seen, as of `now`.
#[must_use]
pub fn velocity_score_at(post: &ContentPost, now: DateTime<Utc>) -> f64 {
    post.velocity_at(now)
}

/// Share of posts contributed by distinct creators.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn creator_diversity(posts: &[ContentPost]) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&str> = posts
        .iter()
        .map(|post| post.creator.creator_id.as_str())
        .collect();
    unique.len() as f64 / posts.len() as f64
}

/// Mean engagement rate.
#[must_use]
pub fn engagement_strength(posts: &[ContentPost]) -> f64 {
    mean(posts.iter().map(engagement_rate), posts.len())
}

#[must_use]
pub fn mean_velocity_at(posts: &[ContentPost], now: DateTime<Utc>) -> f64 {
    mean(posts.iter().map(|post| velocity_score_at(post, now)), posts.len())
}

/// Scale a velocity into `[0, 1]` against `max_velocity`.
#[must_use]
pub fn normalize_velocity(velocity: f64, max_velocity: f64) -> f64 {
    if max_velocity == 0.0 {
        return 0.0;
    }
    (velocity / max_velocity).min(1.0)
}

#[must_use]
pub fn cluster_health(posts: &[ContentPost], weights: &HealthWeights) -> f64 {
    cluster_health_at(posts, weights, Utc::now())
}

/// Weighted blend of diversity, engagement strength and normalized mean
/// velocity, capped at 1.0.
#[must_use]
pub fn cluster_health_at(
    posts: &[ContentPost],
    weights: &HealthWeights,
    now: DateTime<Utc>,
) -> f64 {
    if posts.is_empty() {
        return 0.0;
    }
    blend_health(
        creator_diversity(posts),
        engagement_strength(posts),
        mean_velocity_at(posts, now),
        weights,
    )
}

pub(crate) fn blend_health(
    diversity: f64,
    engagement: f64,
    mean_velocity: f64,
    weights: &HealthWeights,
) -> f64 {
    let velocity = normalize_velocity(mean_velocity, DEFAULT_MAX_VELOCITY);
    (diversity * weights.diversity + engagement * weights.engagement + velocity * weights.velocity)
        .min(1.0)
}

#[must_use]
pub fn detection_confidence(health: f64, diversity: f64) -> f64 {
    (health + diversity) / 2.0
}

/// Average of how close creator and region counts come to their minimums.
///
/// A minimum of zero contributes `0.0` for that factor.
#[must_use]
pub fn validation_confidence(
    creator_count: usize,
    region_count: usize,
    min_creators: u32,
    min_regions: u32,
) -> f64 {
    (capped_ratio(creator_count, min_creators) + capped_ratio(region_count, min_regions)) / 2.0
}

/// Posts per day over `days_active`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn saturation_level(posts: &[ContentPost], days_active: f64) -> f64 {
    if days_active == 0.0 {
        return 0.0;
    }
    posts.len() as f64 / days_active
}

#[allow(clippy::cast_precision_loss)]
fn capped_ratio(count: usize, minimum: u32) -> f64 {
    if minimum == 0 {
        return 0.0;
    }
    (count as f64 / f64::from(minimum)).min(1.0)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use ugci_core::{ContentType, CreatorProfile, MarketRegion, Platform};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
    }

    fn post(id: &str, creator_id: &str, counts: (u64, u64, u64, u64)) -> ContentPost {
        let creator = CreatorProfile::new(
            creator_id,
            creator_id,
            Platform::Tiktok,
            5_000,
            0.05,
            MarketRegion::Us,
        )
        .unwrap();
        let (views, likes, comments, shares) = counts;
        ContentPost::new(id, creator, ContentType::Video, "", ["a", "b"], t0(), t0())
            .with_counts(views, likes, comments, shares, 0)
    }

    #[test]
    fn engagement_rate_matches_reference_example() {
        let p = post("p", "c", (1000, 50, 5, 10));
        assert!((engagement_rate(&p) - 0.065).abs() < 1e-12);
    }

    #[test]
    fn engagement_rate_is_zero_without_views() {
        let p = post("p", "c", (0, 500, 5, 10));
        assert_eq!(engagement_rate(&p), 0.0);
    }

    #[test]
    fn velocity_is_zero_at_first_sight_and_positive_later() {
        let p = post("p", "c", (100, 10, 0, 0));
        assert_eq!(velocity_score_at(&p, t0()), 0.0);
        assert!(velocity_score_at(&p, t0() + Duration::minutes(30)) > 0.0);
    }

    #[test]
    fn diversity_of_ten_posts_by_two_creators() {
        let posts: Vec<ContentPost> = (0..10)
            .map(|i| post(&format!("p{i}"), if i % 2 == 0 { "a" } else { "b" }, (10, 1, 0, 0)))
            .collect();
        assert!((creator_diversity(&posts) - 0.2).abs() < 1e-12);
        assert_eq!(creator_diversity(&[]), 0.0);
    }

    #[test]
    fn engagement_strength_is_mean_rate() {
        let posts = vec![post("p1", "a", (100, 10, 0, 0)), post("p2", "b", (100, 30, 0, 0))];
        assert!((engagement_strength(&posts) - 0.2).abs() < 1e-12);
        assert_eq!(engagement_strength(&[]), 0.0);
    }

    #[test]
    fn normalize_velocity_caps_and_guards_zero_max() {
        assert!((normalize_velocity(250.0, 1000.0) - 0.25).abs() < 1e-12);
        assert_eq!(normalize_velocity(5000.0, 1000.0), 1.0);
        assert_eq!(normalize_velocity(10.0, 0.0), 0.0);
    }

    #[test]
    fn cluster_health_blends_components() {
        // diversity 1.0, engagement 0.1, velocity (10 eng / 1h) / 1000 = 0.01
        let posts = vec![post("p1", "a", (100, 10, 0, 0)), post("p2", "b", (100, 10, 0, 0))];
        let now = t0() + Duration::hours(1);
        let health = cluster_health_at(&posts, &HealthWeights::default(), now);
        let expected = 1.0 * 0.4 + 0.1 * 0.3 + 0.01 * 0.3;
        assert!((health - expected).abs() < 1e-9, "health = {health}");
    }

    #[test]
    fn cluster_health_is_capped_at_one() {
        let posts = vec![post("p1", "a", (10, 100, 0, 0))];
        let weights = HealthWeights {
            diversity: 1.0,
            engagement: 1.0,
            velocity: 1.0,
        };
        assert_eq!(cluster_health_at(&posts, &weights, t0() + Duration::hours(1)), 1.0);
        assert_eq!(cluster_health_at(&[], &weights, t0()), 0.0);
    }

    #[test]
    fn detection_confidence_is_average() {
        assert!((detection_confidence(0.6, 0.2) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn validation_confidence_caps_each_factor() {
        assert!((validation_confidence(5, 1, 10, 2) - 0.5).abs() < 1e-12);
        assert_eq!(validation_confidence(40, 6, 10, 2), 1.0);
        assert!((validation_confidence(2, 2, 10, 2) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn validation_confidence_zero_minimum_contributes_nothing() {
        assert!((validation_confidence(10, 2, 0, 2) - 0.5).abs() < 1e-12);
        assert_eq!(validation_confidence(10, 2, 0, 0), 0.0);
    }

    #[test]
    fn saturation_is_posts_per_day() {
        let posts = vec![post("p1", "a", (1, 0, 0, 0)), post("p2", "a", (1, 0, 0, 0))];
        assert!((saturation_level(&posts, 4.0) - 0.5).abs() < 1e-12);
        assert_eq!(saturation_level(&posts, 0.0), 0.0);
    }

    #[test]
    fn weights_follow_clustering_settings() {
        let settings = ClusteringSettings {
            creator_diversity_weight: 0.5,
            engagement_strength_weight: 0.25,
            velocity_weight: 0.25,
            ..ClusteringSettings::default()
        };
        let weights = HealthWeights::from(&settings);
        assert_eq!(weights.diversity, 0.5);
        assert_eq!(weights.engagement, 0.25);
        assert_eq!(weights.velocity, 0.25);
    }
}
