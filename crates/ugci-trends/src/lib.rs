//! Trend discovery over user-generated content.
//!
//! Posts are grouped by hashtag co-occurrence ([`ClusteringEngine`]), each
//! cluster is judged against creator and region thresholds
//! ([`TrendValidator`]), and signals that clear the caller's confidence floor
//! become [`ProofTile`]s. Every score is a plain formula in [`metrics`]; there
//! is no learned model anywhere in the pipeline.
//!
//! Nothing here performs I/O. A run is a pure function of its posts, its
//! configuration and the `now` it is evaluated at.

pub mod cluster;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod proof_tile;
pub mod trend;

pub use cluster::{Cluster, ClusterHealth, ClusterSnapshot, ClusteringEngine};
pub use error::{ClusteringError, TrendError};
pub use metrics::HealthWeights;
pub use pipeline::{DiscoveryOutcome, DiscoveryPipeline, DiscoveryReport};
pub use proof_tile::{
    CreatorSample, ExamplePost, ProofTile, ProofTileGenerator, SuggestedAction, TileMetrics,
};
pub use trend::{SignalSnapshot, TrendSignal, TrendValidator};
