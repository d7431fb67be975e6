use thiserror::Error;
use ugci_core::Platform;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {platform}")]
    RateLimited {
        platform: Platform,
        retry_after_secs: Option<u64>,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot convert item {key}: {reason}")]
    Conversion { key: String, reason: String },
}

impl IngestError {
    pub(crate) fn conversion(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
