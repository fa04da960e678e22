use labeldesk_core::labeling::{
    LabelingPolicy, DEFAULT_LABELS_PER_ROW, DEFAULT_LEASE_DURATION_MINS,
    DEFAULT_SATURATION_ANNOTATORS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Lease duration and per-row quota used by the labeling engine.
    pub policy: LabelingPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// See [`JwtConfig::from_env`] and [`policy_from_env`] for the rest.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let policy = policy_from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            policy,
        }
    }
}

/// Load the labeling policy from environment variables.
///
/// | Env Var                 | Default |
/// |-------------------------|---------|
/// | `LEASE_DURATION_MINS`   | `15`    |
/// | `LABELS_PER_ROW`        | `5`     |
/// | `SATURATION_ANNOTATORS` | `5`     |
///
/// # Panics
///
/// Panics if a value does not parse or is not positive.
pub fn policy_from_env() -> LabelingPolicy {
    let policy = LabelingPolicy {
        lease_duration_mins: env_i64("LEASE_DURATION_MINS", DEFAULT_LEASE_DURATION_MINS),
        labels_per_row: env_i64("LABELS_PER_ROW", DEFAULT_LABELS_PER_ROW),
        saturation_annotators: env_i64("SATURATION_ANNOTATORS", DEFAULT_SATURATION_ANNOTATORS),
    };
    if let Err(msg) = policy.validate() {
        panic!("Invalid labeling policy: {msg}");
    }
    policy
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("{key} must be a valid i64: {e}"))
}
