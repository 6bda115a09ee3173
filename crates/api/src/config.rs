use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use sealpost_core::proof::{DEFAULT_FRESHNESS_WINDOW_MS, DEFAULT_NAMESPACE};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// SQLite database URL (default: `sqlite://sealpost.db`).
    pub database_url: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Namespace every proof token must carry (default: `msgApp`).
    pub proof_namespace: String,
    /// Maximum proof age in milliseconds (default: `60000`).
    pub max_proof_age_ms: i64,
    /// A stream channel without a heartbeat for this long is closed
    /// (default: `15000`).
    pub channel_idle_ms: u64,
    /// Period of the idle-channel sweep (default: `5000`).
    pub sweep_interval_ms: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8080`                     |
    /// | `DATABASE_URL`         | `sqlite://sealpost.db`     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `PROOF_NAMESPACE`      | `msgApp`                   |
    /// | `MAX_PROOF_AGE_MS`     | `60000`                    |
    /// | `CHANNEL_IDLE_MS`      | `15000`                    |
    /// | `SWEEP_INTERVAL_MS`    | `5000`                     |
    pub fn from_env() -> Self {
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("PORT", 8080),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://sealpost.db".into()),
            cors_origins,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", 30),
            proof_namespace: std::env::var("PROOF_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.into()),
            max_proof_age_ms: env_parse("MAX_PROOF_AGE_MS", DEFAULT_FRESHNESS_WINDOW_MS),
            channel_idle_ms: env_parse("CHANNEL_IDLE_MS", 15_000),
            sweep_interval_ms: env_parse("SWEEP_INTERVAL_MS", 5_000),
        }
    }

    pub fn channel_idle_threshold(&self) -> Duration {
        Duration::from_millis(self.channel_idle_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// Read and parse `key`, falling back to `default` when unset.
///
/// Panics on a value that does not parse, so a typo stops startup.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
