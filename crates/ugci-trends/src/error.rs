use thiserror::Error;

/// Malformed input that aborts a clustering run before any cluster is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusteringError {
    #[error("post at position {position} has an empty post_id")]
    EmptyPostId { position: usize },

    #[error("post_id '{0}' appears more than once")]
    DuplicatePostId(String),

    #[error("post '{post_id}' carries an empty hashtag")]
    EmptyHashtag { post_id: String },
}

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("failed to cluster posts: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("invalid discovery request: {0}")]
    Validation(String),
}
