//! Database operations for `clusters`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgExecutor;
use ugci_core::{MarketRegion, Platform};
use ugci_trends::{ClusterHealth, ClusterSnapshot};

use crate::{to_i32, DbError};

/// A row from the `clusters` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClusterRow {
    pub cluster_id: String,
    pub primary_hashtags: Json<Vec<String>>,
    pub post_ids: Json<Vec<String>>,
    pub platforms: Json<Vec<Platform>>,
    pub regions: Json<Vec<MarketRegion>>,
    pub health_score: f64,
    pub creator_diversity: f64,
    pub engagement_strength: f64,
    pub velocity_score: f64,
    pub detection_confidence: f64,
    pub post_count: i32,
    pub creator_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClusterRow {
    #[must_use]
    pub fn health(&self) -> ClusterHealth {
        ClusterHealth {
            health_score: self.health_score,
            creator_diversity: self.creator_diversity,
            engagement_strength: self.engagement_strength,
            velocity_score: self.velocity_score,
            detection_confidence: self.detection_confidence,
            post_count: usize::try_from(self.post_count).unwrap_or(0),
            creator_count: usize::try_from(self.creator_count).unwrap_or(0),
        }
    }
}

/// Insert or replace a cluster by `cluster_id`. `created_at` survives replacement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_cluster<'e>(
    executor: impl PgExecutor<'e>,
    cluster: &ClusterSnapshot,
) -> Result<(), DbError> {
    let health = &cluster.health;
    sqlx::query(
        "INSERT INTO clusters \
             (cluster_id, primary_hashtags, post_ids, platforms, regions, health_score, \
              creator_diversity, engagement_strength, velocity_score, detection_confidence, \
              post_count, creator_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (cluster_id) DO UPDATE SET \
             primary_hashtags     = EXCLUDED.primary_hashtags, \
             post_ids             = EXCLUDED.post_ids, \
             platforms            = EXCLUDED.platforms, \
             regions              = EXCLUDED.regions, \
             health_score         = EXCLUDED.health_score, \
             creator_diversity    = EXCLUDED.creator_diversity, \
             engagement_strength  = EXCLUDED.engagement_strength, \
             velocity_score       = EXCLUDED.velocity_score, \
             detection_confidence = EXCLUDED.detection_confidence, \
             post_count           = EXCLUDED.post_count, \
             creator_count        = EXCLUDED.creator_count, \
             updated_at           = NOW()",
    )
    .bind(&cluster.cluster_id)
    .bind(Json(&cluster.primary_hashtags))
    .bind(Json(&cluster.post_ids))
    .bind(Json(&cluster.platforms))
    .bind(Json(&cluster.regions))
    .bind(health.health_score)
    .bind(health.creator_diversity)
    .bind(health.engagement_strength)
    .bind(health.velocity_score)
    .bind(health.detection_confidence)
    .bind(to_i32(health.post_count))
    .bind(to_i32(health.creator_count))
    .execute(executor)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id and [`DbError::Sqlx`] if the
/// query fails.
pub async fn get_cluster<'e>(
    executor: impl PgExecutor<'e>,
    cluster_id: &str,
) -> Result<ClusterRow, DbError> {
    sqlx::query_as::<_, ClusterRow>(
        "SELECT cluster_id, primary_hashtags, post_ids, platforms, regions, health_score, \
                creator_diversity, engagement_strength, velocity_score, detection_confidence, \
                post_count, creator_count, created_at, updated_at \
         FROM clusters WHERE cluster_id = $1",
    )
    .bind(cluster_id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}
