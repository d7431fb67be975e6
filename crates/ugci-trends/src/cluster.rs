//! Hashtag co-occurrence clustering.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{ClusteringSettings, ContentPost, MarketRegion, Platform};

use crate::error::{ClusteringError, TrendError};
use crate::metrics::{self, HealthWeights};

/// Scores describing how strong a cluster looks. Computed once per cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub health_score: f64,
    pub creator_diversity: f64,
    pub engagement_strength: f64,
    /// Mean engagements/hour across the cluster's posts (not normalized).
    pub velocity_score: f64,
    pub detection_confidence: f64,
    pub post_count: usize,
    pub creator_count: usize,
}

/// Posts grouped under a shared set of hashtags.
///
/// Posts are fixed at construction; health is computed on first access and
/// memoized for the life of the cluster.
#[derive(Debug)]
pub struct Cluster {
    cluster_id: String,
    posts: Vec<ContentPost>,
    primary_hashtags: Vec<String>,
    health: OnceLock<ClusterHealth>,
}

impl Cluster {
    /// `primary_hashtags` are sorted and deduplicated.
    #[must_use]
    pub fn new(
        cluster_id: impl Into<String>,
        posts: Vec<ContentPost>,
        primary_hashtags: impl IntoIterator<Item = String>,
    ) -> Self {
        let primary_hashtags: BTreeSet<String> = primary_hashtags.into_iter().collect();
        Self {
            cluster_id: cluster_id.into(),
            posts,
            primary_hashtags: primary_hashtags.into_iter().collect(),
            health: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    #[must_use]
    pub fn posts(&self) -> &[ContentPost] {
        &self.posts
    }

    #[must_use]
    pub fn primary_hashtags(&self) -> &[String] {
        &self.primary_hashtags
    }

    #[must_use]
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn unique_creators(&self) -> BTreeSet<&str> {
        self.posts
            .iter()
            .map(|post| post.creator.creator_id.as_str())
            .collect()
    }

    #[must_use]
    pub fn platforms(&self) -> BTreeSet<Platform> {
        self.posts.iter().map(|post| post.platform).collect()
    }

    #[must_use]
    pub fn regions(&self) -> BTreeSet<MarketRegion> {
        self.posts.iter().map(|post| post.creator.region).collect()
    }

    /// Memoized health. Computed with default weights at wall-clock time if
    /// nothing has computed it yet.
    pub fn health(&self) -> &ClusterHealth {
        self.health_with(&HealthWeights::default(), Utc::now())
    }

    /// Memoized health. The first call fixes `weights` and `now`; later calls
    /// return the stored value unchanged.
    pub fn health_with(&self, weights: &HealthWeights, now: DateTime<Utc>) -> &ClusterHealth {
        self.health
            .get_or_init(|| compute_health(&self.posts, weights, now))
    }

    /// Serializable view for persistence and reporting.
    #[must_use]
    pub fn snapshot(&self) -> ClusterSnapshot {
        ClusterSnapshot {
            cluster_id: self.cluster_id.clone(),
            primary_hashtags: self.primary_hashtags.clone(),
            post_ids: self.posts.iter().map(|post| post.post_id.clone()).collect(),
            platforms: self.platforms().into_iter().collect(),
            regions: self.regions().into_iter().collect(),
            health: *self.health(),
        }
    }
}

fn compute_health(
    posts: &[ContentPost],
    weights: &HealthWeights,
    now: DateTime<Utc>,
) -> ClusterHealth {
    let diversity = metrics::creator_diversity(posts);
    let engagement = metrics::engagement_strength(posts);
    let velocity = metrics::mean_velocity_at(posts, now);
    let health_score = if posts.is_empty() {
        0.0
    } else {
        metrics::blend_health(diversity, engagement, velocity, weights)
    };
    let creator_count = posts
        .iter()
        .map(|post| post.creator.creator_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    ClusterHealth {
        health_score,
        creator_diversity: diversity,
        engagement_strength: engagement,
        velocity_score: velocity,
        detection_confidence: metrics::detection_confidence(health_score, diversity),
        post_count: posts.len(),
        creator_count,
    }
}

/// Flat, owned copy of a cluster's identity and scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub cluster_id: String,
    pub primary_hashtags: Vec<String>,
    pub post_ids: Vec<String>,
    pub platforms: Vec<Platform>,
    pub regions: Vec<MarketRegion>,
    pub health: ClusterHealth,
}

/// Groups posts by hashtag co-occurrence.
///
/// Stateless between calls; one engine may serve any number of runs.
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    settings: ClusteringSettings,
    weights: HealthWeights,
}

type HashtagKey = BTreeSet<String>;

impl ClusteringEngine {
    #[must_use]
    pub fn new(settings: ClusteringSettings) -> Self {
        let weights = HealthWeights::from(&settings);
        Self { settings, weights }
    }

    #[must_use]
    pub fn settings(&self) -> &ClusteringSettings {
        &self.settings
    }

    /// # Errors
    ///
    /// See [`ClusteringEngine::cluster_posts_at`].
    pub fn cluster_posts(&self, posts: &[ContentPost]) -> Result<Vec<Cluster>, TrendError> {
        self.cluster_posts_at(posts, Utc::now())
    }

    /// Cluster `posts`, scoring each surviving cluster as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::Clustering`] when a post has an empty or
    /// duplicated `post_id`, or an empty hashtag. Nothing is returned for the
    /// run in that case.
    pub fn cluster_posts_at(
        &self,
        posts: &[ContentPost],
        now: DateTime<Utc>,
    ) -> Result<Vec<Cluster>, TrendError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        check_posts(posts)?;

        let index = build_hashtag_index(posts);
        let cooccurrence = self.hashtag_cooccurrence(&index);
        let seeds = self.seed_clusters(posts, &cooccurrence);
        let seed_count = seeds.len();
        let merged = self.merge_overlapping(seeds.into_iter().collect());

        let clusters: Vec<Cluster> = merged
            .into_iter()
            .enumerate()
            .filter(|(_, (_, members))| members.len() >= self.settings.min_posts_per_cluster)
            .map(|(position, (key, members))| {
                let cluster = Cluster::new(
                    format!("cluster_{position:08x}"),
                    members.iter().map(|&i| posts[i].clone()).collect(),
                    key,
                );
                cluster.health_with(&self.weights, now);
                cluster
            })
            .collect();

        tracing::debug!(
            posts = posts.len(),
            hashtags = index.len(),
            pairs = cooccurrence.len(),
            seeds = seed_count,
            clusters = clusters.len(),
            "clustered posts"
        );

        Ok(clusters)
    }

    /// Pairs of hashtags (lexicographic, `a < b`) whose shared-post count
    /// meets `min_shared_hashtags`.
    fn hashtag_cooccurrence(
        &self,
        index: &BTreeMap<&str, BTreeSet<usize>>,
    ) -> Vec<(String, String, BTreeSet<usize>)> {
        let tags: Vec<(&str, &BTreeSet<usize>)> =
            index.iter().map(|(tag, members)| (*tag, members)).collect();
        let mut pairs = Vec::new();

        for (i, (first, first_posts)) in tags.iter().enumerate() {
            for (second, second_posts) in &tags[i + 1..] {
                let shared: BTreeSet<usize> =
                    first_posts.intersection(second_posts).copied().collect();
                if shared.len() >= self.settings.min_shared_hashtags {
                    pairs.push(((*first).to_string(), (*second).to_string(), shared));
                }
            }
        }

        pairs
    }

    fn seed_clusters(
        &self,
        posts: &[ContentPost],
        cooccurrence: &[(String, String, BTreeSet<usize>)],
    ) -> BTreeMap<HashtagKey, BTreeSet<usize>> {
        let mut seeds: BTreeMap<HashtagKey, BTreeSet<usize>> = BTreeMap::new();

        for (first, second, shared) in cooccurrence {
            let key: HashtagKey = [first.clone(), second.clone()].into_iter().collect();
            seeds.entry(key).or_default().extend(shared);
        }

        // A post carrying enough tags seeds its own cluster keyed by its tag set.
        for (i, post) in posts.iter().enumerate() {
            if post.hashtags.len() >= self.settings.min_shared_hashtags {
                let key: HashtagKey = post.hashtags.iter().cloned().collect();
                seeds.entry(key).or_default().insert(i);
            }
        }

        seeds
    }

    /// Greedy merge by Jaccard similarity of hashtag keys.
    ///
    /// Each candidate joins the first earlier cluster it is similar enough
    /// to, which keeps its key. With `transitive_merge` the surviving key
    /// absorbs the candidate's tags and passes repeat until nothing merges.
    fn merge_overlapping(
        &self,
        mut clusters: Vec<(HashtagKey, BTreeSet<usize>)>,
    ) -> Vec<(HashtagKey, BTreeSet<usize>)> {
        loop {
            let before = clusters.len();
            let mut merged: Vec<(HashtagKey, BTreeSet<usize>)> = Vec::with_capacity(before);

            for (key, members) in clusters {
                let target = merged.iter().position(|(existing, _)| {
                    jaccard(&key, existing) >= self.settings.hashtag_similarity
                });
                match target {
                    Some(at) => {
                        let (existing_key, existing_members) = &mut merged[at];
                        existing_members.extend(members);
                        if self.settings.transitive_merge {
                            existing_key.extend(key);
                        }
                    }
                    None => merged.push((key, members)),
                }
            }

            if !self.settings.transitive_merge || merged.len() == before {
                return merged;
            }
            clusters = merged;
        }
    }
}

/// Reject input the index cannot represent faithfully.
fn check_posts(posts: &[ContentPost]) -> Result<(), ClusteringError> {
    let mut seen = HashSet::with_capacity(posts.len());
    for (position, post) in posts.iter().enumerate() {
        if post.post_id.trim().is_empty() {
            return Err(ClusteringError::EmptyPostId { position });
        }
        if !seen.insert(post.post_id.as_str()) {
            return Err(ClusteringError::DuplicatePostId(post.post_id.clone()));
        }
        if post.hashtags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ClusteringError::EmptyHashtag {
                post_id: post.post_id.clone(),
            });
        }
    }
    Ok(())
}

/// Hashtag to the input positions of the posts carrying it.
fn build_hashtag_index(posts: &[ContentPost]) -> BTreeMap<&str, BTreeSet<usize>> {
    let mut index: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for (i, post) in posts.iter().enumerate() {
        for tag in &post.hashtags {
            index.entry(tag.as_str()).or_default().insert(i);
        }
    }
    index
}

#[allow(clippy::cast_precision_loss)]
fn jaccard(a: &HashtagKey, b: &HashtagKey) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
