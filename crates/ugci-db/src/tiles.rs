//! Database operations for `proof_tiles`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgExecutor;
use ugci_core::{TrendStatus, UrgencyLevel};
use ugci_trends::{CreatorSample, ExamplePost, ProofTile, SuggestedAction, TileMetrics};

use crate::{parse_label, DbError};

/// A row from the `proof_tiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TileRow {
    pub tile_id: String,
    pub trend_id: String,
    pub headline: String,
    pub urgency: String,
    pub recommendation: String,
    pub status: String,
    pub metrics: Json<TileMetrics>,
    pub suggested_action: Json<SuggestedAction>,
    pub example_posts: Json<Vec<ExamplePost>>,
    pub creator_samples: Json<Vec<CreatorSample>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TileRow {
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if a stored urgency or status label is unknown.
    pub fn into_proof_tile(self) -> Result<ProofTile, DbError> {
        let urgency = parse_label("proof_tiles", &self.tile_id, &self.urgency)?;
        let status = parse_label("proof_tiles", &self.tile_id, &self.status)?;
        Ok(ProofTile {
            tile_id: self.tile_id,
            trend_id: self.trend_id,
            headline: self.headline,
            urgency,
            recommendation: self.recommendation,
            status,
            metrics: self.metrics.0,
            suggested_action: self.suggested_action.0,
            example_posts: self.example_posts.0,
            creator_samples: self.creator_samples.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const TILE_COLUMNS: &str = "tile_id, trend_id, headline, urgency, recommendation, status, \
     metrics, suggested_action, example_posts, creator_samples, created_at, updated_at";

/// Insert or replace a tile by `tile_id`. `created_at` survives replacement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when the tile's
/// trend has not been stored.
pub async fn upsert_tile<'e>(
    executor: impl PgExecutor<'e>,
    tile: &ProofTile,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO proof_tiles \
             (tile_id, trend_id, headline, urgency, recommendation, status, metrics, \
              suggested_action, example_posts, creator_samples, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (tile_id) DO UPDATE SET \
             headline         = EXCLUDED.headline, \
             urgency          = EXCLUDED.urgency, \
             recommendation   = EXCLUDED.recommendation, \
             status           = EXCLUDED.status, \
             metrics          = EXCLUDED.metrics, \
             suggested_action = EXCLUDED.suggested_action, \
             example_posts    = EXCLUDED.example_posts, \
             creator_samples  = EXCLUDED.creator_samples, \
             updated_at       = EXCLUDED.updated_at",
    )
    .bind(&tile.tile_id)
    .bind(&tile.trend_id)
    .bind(&tile.headline)
    .bind(tile.urgency.as_str())
    .bind(&tile.recommendation)
    .bind(tile.status.as_str())
    .bind(Json(&tile.metrics))
    .bind(Json(&tile.suggested_action))
    .bind(Json(&tile.example_posts))
    .bind(Json(&tile.creator_samples))
    .bind(tile.created_at)
    .bind(tile.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn list_tiles_where<'e>(
    executor: impl PgExecutor<'e>,
    column: &'static str,
    value: &str,
    limit: i64,
) -> Result<Vec<ProofTile>, DbError> {
    let rows = sqlx::query_as::<_, TileRow>(&format!(
        "SELECT {TILE_COLUMNS} FROM proof_tiles WHERE {column} = $1 \
         ORDER BY updated_at DESC, tile_id LIMIT $2"
    ))
    .bind(value)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    rows.into_iter().map(TileRow::into_proof_tile).collect()
}

/// Most recently updated tiles generated for signals in `status`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Decode`] for a
/// row with an unknown label.
pub async fn list_tiles_by_status<'e>(
    executor: impl PgExecutor<'e>,
    status: TrendStatus,
    limit: i64,
) -> Result<Vec<ProofTile>, DbError> {
    list_tiles_where(executor, "status", status.as_str(), limit).await
}

/// Most recently updated tiles at `urgency`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Decode`] for a
/// row with an unknown label.
pub async fn list_tiles_by_urgency<'e>(
    executor: impl PgExecutor<'e>,
    urgency: UrgencyLevel,
    limit: i64,
) -> Result<Vec<ProofTile>, DbError> {
    list_tiles_where(executor, "urgency", urgency.as_str(), limit).await
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_tiles_by_status<'e>(
    executor: impl PgExecutor<'e>,
    status: TrendStatus,
) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM proof_tiles WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(executor)
            .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(urgency: &str) -> TileRow {
        let now = Utc::now();
        TileRow {
            tile_id: "tile_signal_cluster_00000001".to_owned(),
            trend_id: "signal_cluster_00000001".to_owned(),
            headline: "emerging trend: matcha - 3 creators, 9 posts".to_owned(),
            urgency: urgency.to_owned(),
            recommendation: "prepare: develop concepts".to_owned(),
            status: "validating".to_owned(),
            metrics: Json(TileMetrics::default()),
            suggested_action: Json(SuggestedAction::default()),
            example_posts: Json(Vec::new()),
            creator_samples: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_rebuilds_tile() {
        let tile = row("medium").into_proof_tile().unwrap();
        assert_eq!(tile.urgency, UrgencyLevel::Medium);
        assert_eq!(tile.status, TrendStatus::Validating);
        assert_eq!(tile.trend_id, "signal_cluster_00000001");
    }

    #[test]
    fn unknown_urgency_is_a_decode_error() {
        assert!(matches!(
            row("urgent").into_proof_tile(),
            Err(DbError::Decode { table: "proof_tiles", .. })
        ));
    }
}
