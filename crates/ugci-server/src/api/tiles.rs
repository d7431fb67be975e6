use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use ugci_core::{TrendStatus, UrgencyLevel};
use ugci_trends::ProofTile;

use crate::error::DomainError;
use crate::middleware::RequestId;

use super::{map_domain_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct TilesQuery {
    pub status: Option<String>,
    pub urgency: Option<String>,
    pub limit: Option<i64>,
}

/// Which column a tile listing filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TileFilter {
    Status(TrendStatus),
    Urgency(UrgencyLevel),
}

impl TilesQuery {
    /// `status` takes precedence over `urgency`; neither means validated tiles.
    fn filter(&self) -> Result<TileFilter, DomainError> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };

        if let Some(status) = present(&self.status) {
            return Ok(TileFilter::Status(status.parse()?));
        }
        if let Some(urgency) = present(&self.urgency) {
            return Ok(TileFilter::Urgency(urgency.parse()?));
        }
        Ok(TileFilter::Status(TrendStatus::Validated))
    }
}

/// GET /api/v1/tiles: most recently updated proof tiles.
pub(in crate::api) async fn list_tiles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TilesQuery>,
) -> Result<Json<ApiResponse<Vec<ProofTile>>>, ApiError> {
    let filter = query
        .filter()
        .map_err(|e| map_domain_error(req_id.0.clone(), e))?;
    let limit = normalize_limit(query.limit);

    let tiles = match filter {
        TileFilter::Status(status) => {
            ugci_db::list_tiles_by_status(&state.pool, status, limit).await
        }
        TileFilter::Urgency(urgency) => {
            ugci_db::list_tiles_by_urgency(&state.pool, urgency, limit).await
        }
    }
    .map_err(|e| map_domain_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: tiles,
        meta: ResponseMeta::new(req_id.0),
    }))
}
