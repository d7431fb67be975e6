use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the variables already in the process.
///
/// Does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration from an env-var lookup function.
///
/// Kept separate from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got '{raw}'"))
            }),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("UGCI_ENV", "development"))?;

    let bind_addr = parse_addr("UGCI_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("UGCI_LOG_LEVEL", "info");
    let cors_enabled = parse_bool("UGCI_CORS_ENABLED", true)?;
    let discovery_config_path = PathBuf::from(or_default(
        "UGCI_DISCOVERY_CONFIG_PATH",
        "./config/discovery.yaml",
    ));

    let db_max_connections = parse_u32("UGCI_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("UGCI_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("UGCI_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let ingest_request_timeout_secs = parse_u64("UGCI_INGEST_REQUEST_TIMEOUT_SECS", "10")?;
    let ingest_max_retries = parse_u32("UGCI_INGEST_MAX_RETRIES", "3")?;
    let ingest_retry_backoff_base_ms = parse_u64("UGCI_INGEST_RETRY_BACKOFF_BASE_MS", "1000")?;

    let tiktok_api_key = lookup("TIKTOK_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let tiktok_base_url = or_default("UGCI_TIKTOK_BASE_URL", "https://api.tiktok.com/v1");
    let tiktok_rate_limit = parse_u32("UGCI_TIKTOK_RATE_LIMIT", "100")?;

    let xiaohongshu_enabled = parse_bool("UGCI_XIAOHONGSHU_ENABLED", true)?;
    let xiaohongshu_base_url = or_default(
        "UGCI_XIAOHONGSHU_BASE_URL",
        "https://edith.xiaohongshu.com/api/sns/v1",
    );
    let xiaohongshu_rate_limit = parse_u32("UGCI_XIAOHONGSHU_RATE_LIMIT", "60")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        cors_enabled,
        discovery_config_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        ingest_request_timeout_secs,
        ingest_max_retries,
        ingest_retry_backoff_base_ms,
        tiktok_api_key,
        tiktok_base_url,
        tiktok_rate_limit,
        xiaohongshu_enabled,
        xiaohongshu_base_url,
        xiaohongshu_rate_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "UGCI_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
