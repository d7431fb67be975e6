//! Bulk post ingestion.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugci_core::{ContentPost, ContentType, CreatorProfile, MarketRegion, Platform};

use crate::error::DomainError;
use crate::middleware::RequestId;

use super::{map_domain_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct IngestPostRequest {
    pub post_id: String,
    pub platform: String,
    pub creator_id: String,
    pub creator_username: String,
    pub creator_follower_count: u64,
    pub creator_region: String,
    pub content_type: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub saves: u64,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct BulkIngestRequest {
    pub posts: Vec<IngestPostRequest>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct IngestResponse {
    pub ingested: u64,
    pub total_posts: usize,
}

impl IngestPostRequest {
    /// Build a post first observed at `now`. The creator's historical
    /// engagement rate is unknown at this boundary and starts at zero.
    fn into_content_post(self, now: DateTime<Utc>) -> Result<ContentPost, DomainError> {
        if self.post_id.trim().is_empty() {
            return Err(DomainError::validation("post_id must not be empty"));
        }
        if self.creator_id.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "post {}: creator_id must not be empty",
                self.post_id
            )));
        }

        let platform: Platform = self.platform.parse()?;
        let region: MarketRegion = self.creator_region.parse()?;
        let content_type: ContentType = self.content_type.parse()?;
        let creator = CreatorProfile::new(
            self.creator_id,
            self.creator_username,
            platform,
            self.creator_follower_count,
            0.0,
            region,
        )?;

        Ok(ContentPost::new(
            self.post_id,
            creator,
            content_type,
            self.caption,
            self.hashtags,
            self.timestamp,
            now,
        )
        .with_counts(self.views, self.likes, self.comments, self.shares, self.saves))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/posts/ingest: upsert a batch of posts by `post_id`.
pub(in crate::api) async fn ingest_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BulkIngestRequest>,
) -> Result<Json<ApiResponse<IngestResponse>>, ApiError> {
    if body.posts.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "no posts provided"));
    }

    let now = Utc::now();
    let posts = body
        .posts
        .into_iter()
        .map(|post| post.into_content_post(now))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_domain_error(req_id.0.clone(), e))?;

    let ingested = ugci_db::upsert_posts(&state.pool, &posts)
        .await
        .map_err(|e| map_domain_error(req_id.0.clone(), e))?;

    tracing::info!(total = posts.len(), ingested, "ingested posts");

    Ok(Json(ApiResponse {
        data: IngestResponse {
            ingested,
            total_posts: posts.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
