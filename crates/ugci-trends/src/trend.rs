//! Trend signals and the validator that assigns their lifecycle status.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{MarketRegion, Platform, TrendStatus, ValidationSettings};

use crate::cluster::Cluster;
use crate::metrics;

/// Health below which a cluster is treated as a weak signal.
pub const EMERGING_HEALTH_FLOOR: f64 = 0.5;

/// A cluster judged against validation thresholds.
///
/// The cluster is shared read-only. `status` only changes through
/// [`TrendSignal::update_status`].
#[derive(Debug, Clone)]
pub struct TrendSignal {
    signal_id: String,
    cluster: Arc<Cluster>,
    status: TrendStatus,
    first_detected: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    min_creators: u32,
    min_regions: u32,
    validation_confidence: OnceLock<f64>,
}

impl TrendSignal {
    #[must_use]
    pub fn new(
        cluster: Arc<Cluster>,
        status: TrendStatus,
        first_detected: DateTime<Utc>,
        settings: &ValidationSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_confidence(cluster, status, first_detected, settings, now, None)
    }

    /// Like [`TrendSignal::new`], seeding the memoized validation confidence
    /// when the caller already computed it.
    pub(crate) fn with_confidence(
        cluster: Arc<Cluster>,
        status: TrendStatus,
        first_detected: DateTime<Utc>,
        settings: &ValidationSettings,
        now: DateTime<Utc>,
        validation_confidence: Option<f64>,
    ) -> Self {
        Self {
            signal_id: format!("signal_{}", cluster.cluster_id()),
            cluster,
            status,
            first_detected,
            last_updated: now,
            min_creators: settings.min_creators,
            min_regions: settings.min_regions,
            validation_confidence: validation_confidence.map_or_else(OnceLock::new, OnceLock::from),
        }
    }

    #[must_use]
    pub fn signal_id(&self) -> &str {
        &self.signal_id
    }

    #[must_use]
    pub fn cluster(&self) -> &Arc<Cluster> {
        &self.cluster
    }

    #[must_use]
    pub fn status(&self) -> TrendStatus {
        self.status
    }

    #[must_use]
    pub fn first_detected(&self) -> DateTime<Utc> {
        self.first_detected
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    #[must_use]
    pub fn creator_replication_count(&self) -> usize {
        self.cluster.unique_creators().len()
    }

    #[must_use]
    pub fn post_count(&self) -> usize {
        self.cluster.post_count()
    }

    #[must_use]
    pub fn platforms(&self) -> BTreeSet<Platform> {
        self.cluster.platforms()
    }

    #[must_use]
    pub fn regions(&self) -> BTreeSet<MarketRegion> {
        self.cluster.regions()
    }

    #[must_use]
    pub fn primary_hashtags(&self) -> &[String] {
        self.cluster.primary_hashtags()
    }

    #[must_use]
    pub fn detection_confidence(&self) -> f64 {
        self.cluster.health().detection_confidence
    }

    /// Memoized on first read.
    #[must_use]
    pub fn validation_confidence(&self) -> f64 {
        *self.validation_confidence.get_or_init(|| {
            metrics::validation_confidence(
                self.creator_replication_count(),
                self.regions().len(),
                self.min_creators,
                self.min_regions,
            )
        })
    }

    /// Set the lifecycle status from outside the validator.
    ///
    /// This is the only way a signal reaches `Saturated` or `Declining`.
    pub fn update_status(&mut self, status: TrendStatus) {
        self.update_status_at(status, Utc::now());
    }

    pub fn update_status_at(&mut self, status: TrendStatus, now: DateTime<Utc>) {
        tracing::debug!(
            signal_id = %self.signal_id,
            from = %self.status,
            to = %status,
            "trend status updated"
        );
        self.status = status;
        self.last_updated = now;
    }

    /// Serializable view for persistence and reporting.
    #[must_use]
    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            signal_id: self.signal_id.clone(),
            cluster_id: self.cluster.cluster_id().to_string(),
            status: self.status,
            first_detected: self.first_detected,
            last_updated: self.last_updated,
            creator_count: self.creator_replication_count(),
            post_count: self.post_count(),
            platforms: self.platforms().into_iter().collect(),
            regions: self.regions().into_iter().collect(),
            primary_hashtags: self.primary_hashtags().to_vec(),
            detection_confidence: self.detection_confidence(),
            validation_confidence: self.validation_confidence(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub signal_id: String,
    pub cluster_id: String,
    pub status: TrendStatus,
    pub first_detected: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub creator_count: usize,
    pub post_count: usize,
    pub platforms: Vec<Platform>,
    pub regions: Vec<MarketRegion>,
    pub primary_hashtags: Vec<String>,
    pub detection_confidence: f64,
    pub validation_confidence: f64,
}

/// Assigns `Emerging`, `Validating` or `Validated` to clusters.
#[derive(Debug, Clone)]
pub struct TrendValidator {
    settings: ValidationSettings,
}

impl TrendValidator {
    #[must_use]
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn validate_cluster(
        &self,
        cluster: Arc<Cluster>,
        first_detected: DateTime<Utc>,
    ) -> TrendSignal {
        self.validate_cluster_at(cluster, first_detected, Utc::now())
    }

    /// Judge `cluster` and wrap it in a signal last updated at `now`.
    #[must_use]
    pub fn validate_cluster_at(
        &self,
        cluster: Arc<Cluster>,
        first_detected: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> TrendSignal {
        let health = cluster.health().health_score;
        let mut confidence = None;

        let status = if health < EMERGING_HEALTH_FLOOR {
            TrendStatus::Emerging
        } else {
            let creator_count = cluster.unique_creators().len();
            let region_count = cluster.regions().len();
            let platform_count = cluster.platforms().len();

            let validation = metrics::validation_confidence(
                creator_count,
                region_count,
                self.settings.min_creators,
                self.settings.min_regions,
            );
            confidence = Some(validation);

            let enough_creators = creator_count >= self.min_creators();
            if validation >= self.settings.confidence_threshold {
                TrendStatus::Validated
            } else if enough_creators {
                // Cross-platform presence does not change the outcome here.
                tracing::debug!(
                    cluster_id = cluster.cluster_id(),
                    platform_count,
                    "cluster has enough creators but low validation confidence"
                );
                TrendStatus::Validating
            } else {
                TrendStatus::Emerging
            }
        };

        let signal = TrendSignal::with_confidence(
            cluster,
            status,
            first_detected,
            &self.settings,
            now,
            confidence,
        );

        tracing::debug!(
            signal_id = signal.signal_id(),
            status = %status,
            health,
            "validated cluster"
        );

        signal
    }

    /// Re-run validation on the signal's current cluster.
    ///
    /// Returns a new signal; `first_detected` carries over from `signal`.
    #[must_use]
    pub fn revalidate_signal(&self, signal: &TrendSignal) -> TrendSignal {
        self.validate_cluster(Arc::clone(&signal.cluster), signal.first_detected)
    }

    fn min_creators(&self) -> usize {
        usize::try_from(self.settings.min_creators).unwrap_or(usize::MAX)
    }
}
