//! Domain failures surfaced by request handlers.

use thiserror::Error;
use ugci_core::CoreError;
use ugci_db::DbError;
use ugci_ingest::IngestError;
use ugci_trends::{ClusteringError, TrendError};

/// Every failure a handler can hit below the HTTP layer.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestError),

    #[error("clustering failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable error code rendered in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ingestion(IngestError::RateLimited { .. }) => "rate_limited",
            Self::Ingestion(_) => "upstream_error",
            Self::Clustering(_) => "clustering_error",
            Self::Validation(_) => "validation_error",
            Self::Database(DbError::NotFound) => "not_found",
            Self::Database(_) => "internal_error",
        }
    }

    /// Message safe to show a caller. Database internals are not exposed.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(DbError::NotFound) => "record not found".to_owned(),
            Self::Database(_) => "database query failed".to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<TrendError> for DomainError {
    fn from(err: TrendError) -> Self {
        match err {
            TrendError::Clustering(inner) => Self::Clustering(inner),
            TrendError::Validation(message) => Self::Validation(message),
        }
    }
}

impl From<CoreError> for DomainError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}
