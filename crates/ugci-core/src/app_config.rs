use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level settings read from the environment.
///
/// Discovery thresholds live separately in [`crate::DiscoveryConfig`], loaded
/// from `discovery_config_path`.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub cors_enabled: bool,
    pub discovery_config_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub ingest_request_timeout_secs: u64,
    pub ingest_max_retries: u32,
    pub ingest_retry_backoff_base_ms: u64,
    pub tiktok_api_key: Option<String>,
    pub tiktok_base_url: String,
    /// Requests per minute; 0 disables pacing.
    pub tiktok_rate_limit: u32,
    pub xiaohongshu_enabled: bool,
    pub xiaohongshu_base_url: String,
    pub xiaohongshu_rate_limit: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("cors_enabled", &self.cors_enabled)
            .field("discovery_config_path", &self.discovery_config_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "ingest_request_timeout_secs",
                &self.ingest_request_timeout_secs,
            )
            .field("ingest_max_retries", &self.ingest_max_retries)
            .field(
                "ingest_retry_backoff_base_ms",
                &self.ingest_retry_backoff_base_ms,
            )
            .field(
                "tiktok_api_key",
                &self.tiktok_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("tiktok_base_url", &self.tiktok_base_url)
            .field("tiktok_rate_limit", &self.tiktok_rate_limit)
            .field("xiaohongshu_enabled", &self.xiaohongshu_enabled)
            .field("xiaohongshu_base_url", &self.xiaohongshu_base_url)
            .field("xiaohongshu_rate_limit", &self.xiaohongshu_rate_limit)
            .finish()
    }
}
