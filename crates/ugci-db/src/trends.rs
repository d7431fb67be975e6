//! Database operations for `trends`.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgExecutor;
use ugci_core::TrendStatus;
use ugci_trends::SignalSnapshot;

use crate::{parse_label, to_i32, DbError};

/// A row from the `trends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRow {
    pub signal_id: String,
    pub cluster_id: String,
    pub status: String,
    /// Hashtag key of the cluster this signal was last computed from.
    pub primary_hashtags: Json<Vec<String>>,
    pub first_detected: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub validation_confidence: f64,
    pub detection_confidence: f64,
    pub creator_count: i32,
    pub post_count: i32,
}

impl TrendRow {
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if the stored status label is unknown.
    pub fn status(&self) -> Result<TrendStatus, DbError> {
        parse_label("trends", &self.signal_id, &self.status)
    }
}

/// Insert or refresh a signal by `signal_id`.
///
/// Signal ids follow cluster positions within a run, so the same id can name
/// a different hashtag set from one run to the next. The stored
/// `first_detected` survives only when the hashtag key is unchanged; status,
/// confidences and counts always take the new values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when the signal's
/// cluster has not been stored.
pub async fn upsert_trend<'e>(
    executor: impl PgExecutor<'e>,
    signal: &SignalSnapshot,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO trends \
             (signal_id, cluster_id, status, primary_hashtags, first_detected, last_updated, \
              validation_confidence, detection_confidence, creator_count, post_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (signal_id) DO UPDATE SET \
             cluster_id            = EXCLUDED.cluster_id, \
             first_detected        = CASE \
                 WHEN trends.primary_hashtags = EXCLUDED.primary_hashtags \
                 THEN trends.first_detected \
                 ELSE EXCLUDED.first_detected \
             END, \
             primary_hashtags      = EXCLUDED.primary_hashtags, \
             status                = EXCLUDED.status, \
             last_updated          = EXCLUDED.last_updated, \
             validation_confidence = EXCLUDED.validation_confidence, \
             detection_confidence  = EXCLUDED.detection_confidence, \
             creator_count         = EXCLUDED.creator_count, \
             post_count            = EXCLUDED.post_count",
    )
    .bind(&signal.signal_id)
    .bind(&signal.cluster_id)
    .bind(signal.status.as_str())
    .bind(Json(&signal.primary_hashtags))
    .bind(signal.first_detected)
    .bind(signal.last_updated)
    .bind(signal.validation_confidence)
    .bind(signal.detection_confidence)
    .bind(to_i32(signal.creator_count))
    .bind(to_i32(signal.post_count))
    .execute(executor)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] for an unknown id and [`DbError::Sqlx`] if the
/// query fails.
pub async fn get_trend<'e>(
    executor: impl PgExecutor<'e>,
    signal_id: &str,
) -> Result<TrendRow, DbError> {
    sqlx::query_as::<_, TrendRow>(
        "SELECT signal_id, cluster_id, status, primary_hashtags, first_detected, last_updated, \
                validation_confidence, detection_confidence, creator_count, post_count \
         FROM trends WHERE signal_id = $1",
    )
    .bind(signal_id)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Trends still worth acting on: validating or validated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_trends<'e>(executor: impl PgExecutor<'e>) -> Result<i64, DbError> {
    let active: Vec<&str> = TrendStatus::ALL
        .iter()
        .filter(|status| status.is_active())
        .map(|status| status.as_str())
        .collect();
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trends WHERE status = ANY($1)")
        .bind(&active)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_label_round_trips() {
        let mut row = TrendRow {
            signal_id: "signal_cluster_00000000".to_owned(),
            cluster_id: "cluster_00000000".to_owned(),
            status: "validating".to_owned(),
            primary_hashtags: Json(vec!["latte".to_owned(), "matcha".to_owned()]),
            first_detected: Utc::now(),
            last_updated: Utc::now(),
            validation_confidence: 0.75,
            detection_confidence: 0.6,
            creator_count: 8,
            post_count: 20,
        };
        assert_eq!(row.status().unwrap(), TrendStatus::Validating);

        row.status = "viral".to_owned();
        assert!(matches!(row.status(), Err(DbError::Decode { table: "trends", .. })));
    }
}
