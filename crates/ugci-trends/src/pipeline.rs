//! One discovery cycle: cluster, validate, and build tiles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ugci_core::{ContentPost, DiscoveryConfig};

use crate::cluster::{Cluster, ClusterSnapshot, ClusteringEngine};
use crate::error::TrendError;
use crate::proof_tile::{ProofTile, ProofTileGenerator};
use crate::trend::{SignalSnapshot, TrendSignal, TrendValidator};

/// Everything a run produced.
///
/// `signals` met the confidence floor and each has a tile in `tiles` at the
/// same position. `dismissed` holds the signals that fell short.
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    pub clusters: Vec<Arc<Cluster>>,
    pub signals: Vec<TrendSignal>,
    pub tiles: Vec<ProofTile>,
    pub dismissed: Vec<TrendSignal>,
}

impl DiscoveryOutcome {
    #[must_use]
    pub fn tile_ids(&self) -> Vec<String> {
        self.tiles.iter().map(|tile| tile.tile_id.clone()).collect()
    }

    #[must_use]
    pub fn report(&self) -> DiscoveryReport {
        DiscoveryReport {
            clusters_found: self.clusters.len(),
            trends_validated: self.signals.len(),
            proof_tiles_generated: self.tiles.len(),
            clusters: self.clusters.iter().map(|c| c.snapshot()).collect(),
            signals: self.signals.iter().map(TrendSignal::snapshot).collect(),
            dismissed: self.dismissed.iter().map(TrendSignal::snapshot).collect(),
            tiles: self.tiles.clone(),
        }
    }
}

/// Serializable summary of a [`DiscoveryOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub clusters_found: usize,
    pub trends_validated: usize,
    pub proof_tiles_generated: usize,
    pub clusters: Vec<ClusterSnapshot>,
    pub signals: Vec<SignalSnapshot>,
    pub dismissed: Vec<SignalSnapshot>,
    pub tiles: Vec<ProofTile>,
}

/// Engine, validator and generator configured from one [`DiscoveryConfig`].
#[derive(Debug, Clone)]
pub struct DiscoveryPipeline {
    engine: ClusteringEngine,
    validator: TrendValidator,
    generator: ProofTileGenerator,
}

impl DiscoveryPipeline {
    #[must_use]
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            engine: ClusteringEngine::new(config.clustering.clone()),
            validator: TrendValidator::new(config.validation.clone()),
            generator: ProofTileGenerator::new(config.proof.clone()),
        }
    }

    /// Run one discovery cycle over `posts`, evaluated as of `now`.
    ///
    /// Signals whose validation confidence is at least `min_confidence` get a
    /// proof tile. New signals are stamped as first detected at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::Validation`] for a `min_confidence` outside
    /// `[0, 1]` and [`TrendError::Clustering`] for malformed posts.
    pub fn run(
        &self,
        posts: &[ContentPost],
        min_confidence: f64,
        now: DateTime<Utc>,
    ) -> Result<DiscoveryOutcome, TrendError> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(TrendError::Validation(format!(
                "min_confidence must be within [0, 1], got {min_confidence}"
            )));
        }

        let clusters: Vec<Arc<Cluster>> = self
            .engine
            .cluster_posts_at(posts, now)?
            .into_iter()
            .map(Arc::new)
            .collect();

        let mut outcome = DiscoveryOutcome {
            clusters: clusters.clone(),
            ..DiscoveryOutcome::default()
        };

        for cluster in clusters {
            let signal = self.validator.validate_cluster_at(cluster, now, now);
            if signal.validation_confidence() >= min_confidence {
                outcome.tiles.push(self.generator.generate_at(&signal, now));
                outcome.signals.push(signal);
            } else {
                outcome.dismissed.push(signal);
            }
        }

        tracing::info!(
            posts = posts.len(),
            clusters = outcome.clusters.len(),
            signals = outcome.signals.len(),
            dismissed = outcome.dismissed.len(),
            tiles = outcome.tiles.len(),
            min_confidence,
            "discovery run complete"
        );

        Ok(outcome)
    }
}
