use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ugci_core::{MarketRegion, Platform, TrendStatus};
use ugci_db::{ClusterRow, DbError, TrendRow};

use crate::middleware::RequestId;

use super::{map_domain_error, ApiError, ApiResponse, AppState, ResponseMeta};

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Serialize)]
pub(in crate::api) struct ConfidenceScores {
    pub detection: f64,
    pub validation: f64,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct GrowthMetrics {
    pub velocity: f64,
    /// Posts per day since first detection, counting at least one day.
    pub saturation: f64,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct TrendDetail {
    pub trend_id: String,
    pub cluster_id: String,
    pub status: TrendStatus,
    pub creator_count: i32,
    pub post_count: i32,
    pub platforms: Vec<Platform>,
    pub regions: Vec<MarketRegion>,
    pub primary_hashtags: Vec<String>,
    pub first_detected: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub confidence_scores: ConfidenceScores,
    pub growth_metrics: GrowthMetrics,
}

fn build_detail(
    trend: TrendRow,
    cluster: ClusterRow,
    now: DateTime<Utc>,
) -> Result<TrendDetail, DbError> {
    let status = trend.status()?;
    #[allow(clippy::cast_precision_loss)]
    let days_active =
        ((now - trend.first_detected).num_seconds() as f64 / SECONDS_PER_DAY).max(1.0);
    let saturation = f64::from(cluster.post_count) / days_active;

    Ok(TrendDetail {
        trend_id: trend.signal_id,
        cluster_id: trend.cluster_id,
        status,
        creator_count: cluster.creator_count,
        post_count: cluster.post_count,
        platforms: cluster.platforms.0,
        regions: cluster.regions.0,
        primary_hashtags: cluster.primary_hashtags.0,
        first_detected: trend.first_detected,
        last_updated: trend.last_updated,
        confidence_scores: ConfidenceScores {
            detection: cluster.detection_confidence,
            validation: trend.validation_confidence,
        },
        growth_metrics: GrowthMetrics {
            velocity: cluster.velocity_score,
            saturation,
        },
    })
}

/// GET /api/v1/trends/{trend_id}: one signal joined with its cluster.
pub(in crate::api) async fn get_trend_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(trend_id): Path<String>,
) -> Result<Json<ApiResponse<TrendDetail>>, ApiError> {
    let rid = &req_id.0;

    let trend = match ugci_db::get_trend(&state.pool, &trend_id).await {
        Ok(trend) => trend,
        Err(DbError::NotFound) => {
            return Err(ApiError::new(rid.as_str(), "not_found", "trend not found"));
        }
        Err(e) => return Err(map_domain_error(rid.clone(), e)),
    };

    let cluster = match ugci_db::get_cluster(&state.pool, &trend.cluster_id).await {
        Ok(cluster) => cluster,
        Err(DbError::NotFound) => {
            return Err(ApiError::new(rid.as_str(), "not_found", "cluster not found"));
        }
        Err(e) => return Err(map_domain_error(rid.clone(), e)),
    };

    let detail =
        build_detail(trend, cluster, Utc::now()).map_err(|e| map_domain_error(rid.clone(), e))?;

    Ok(Json(ApiResponse {
        data: detail,
        meta: ResponseMeta::new(req_id.0),
    }))
}
