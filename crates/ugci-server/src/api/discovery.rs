//! Running a discovery cycle over stored posts.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{DiscoveryConfig, Platform, TimeWindow, WindowKind, WindowManager};
use ugci_trends::DiscoveryPipeline;

use crate::error::DomainError;
use crate::middleware::RequestId;

use super::{map_domain_error, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;

fn default_window_type() -> String {
    WindowKind::EarlyDetection.as_str().to_owned()
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct DiscoveryRequest {
    #[serde(default = "default_window_type")]
    pub window_type: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DiscoveryResponse {
    pub clusters_found: usize,
    pub trends_validated: usize,
    pub proof_tiles_generated: usize,
    pub tile_ids: Vec<String>,
    pub posts_considered: usize,
    pub window: TimeWindow,
}

/// A request checked against the configured windows, ready to run.
#[derive(Debug, PartialEq)]
struct DiscoveryPlan {
    window: TimeWindow,
    platforms: Vec<Platform>,
    min_confidence: f64,
}

impl DiscoveryRequest {
    fn plan(
        &self,
        config: &DiscoveryConfig,
        now: DateTime<Utc>,
    ) -> Result<DiscoveryPlan, DomainError> {
        if self.platforms.is_empty() {
            return Err(DomainError::validation("no platforms specified"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(DomainError::validation(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }

        let kind: WindowKind = self.window_type.parse()?;
        let mut platforms = self
            .platforms
            .iter()
            .map(|p| p.parse::<Platform>())
            .collect::<Result<Vec<_>, _>>()?;
        platforms.sort();
        platforms.dedup();

        let window = WindowManager::new(config.windows.clone()).create_window(kind, now)?;
        Ok(DiscoveryPlan {
            window,
            platforms,
            min_confidence: self.min_confidence,
        })
    }
}

/// POST /api/v1/discovery/run: cluster, validate and persist one window.
pub(in crate::api) async fn run_discovery(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<DiscoveryRequest>,
) -> Result<Json<ApiResponse<DiscoveryResponse>>, ApiError> {
    let rid = &req_id.0;
    let now = Utc::now();
    let plan = body
        .plan(&state.discovery, now)
        .map_err(|e| map_domain_error(rid.clone(), e))?;

    let posts = ugci_db::list_posts_in_window(
        &state.pool,
        plan.window.start,
        plan.window.end,
        &plan.platforms,
    )
    .await
    .map_err(|e| map_domain_error(rid.clone(), e))?;
    let posts_considered = posts.len();

    let pipeline = DiscoveryPipeline::new(&state.discovery);
    let min_confidence = plan.min_confidence;
    let outcome = tokio::task::spawn_blocking(move || pipeline.run(&posts, min_confidence, now))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "discovery task panicked");
            ApiError::new(rid.as_str(), "internal_error", "discovery run failed")
        })?
        .map_err(|e| map_domain_error(rid.clone(), e))?;

    ugci_db::persist_discovery(&state.pool, &outcome)
        .await
        .map_err(|e| map_domain_error(rid.clone(), e))?;

    tracing::info!(
        window = %plan.window.kind,
        platforms = plan.platforms.len(),
        posts = posts_considered,
        clusters = outcome.clusters.len(),
        tiles = outcome.tiles.len(),
        "discovery run served"
    );

    Ok(Json(ApiResponse {
        data: DiscoveryResponse {
            clusters_found: outcome.clusters.len(),
            trends_validated: outcome.signals.len(),
            proof_tiles_generated: outcome.tiles.len(),
            tile_ids: outcome.tile_ids(),
            posts_considered,
            window: plan.window,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
