//! Shared domain types and configuration for the UGC trend-discovery system.
//!
//! Everything downstream (pipeline, ingestion, persistence, HTTP) speaks in
//! terms of the [`ContentPost`] shape defined here.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod discovery;
pub mod models;
pub mod window;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use discovery::{
    load_discovery_config, ClusteringSettings, DiscoveryConfig, ProofSettings, ValidationSettings,
    WindowSettings, MAX_WINDOW_HOURS,
};
pub use models::{
    normalize_hashtags, ContentPost, ContentType, CreatorProfile, CreatorTier, MarketRegion,
    Platform, TrendStatus, UrgencyLevel,
};
pub use window::{TimeWindow, WindowKind, WindowManager};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read discovery config {path}: {source}")]
    DiscoveryFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse discovery config: {0}")]
    DiscoveryFileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
