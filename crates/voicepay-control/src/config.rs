//! Environment-driven configuration for the control plane, following the
//! teacher's `GatewayConfig::from_env` shape: typed fields, a redacting
//! `Debug` impl, and a dedicated error enum for missing/invalid values.

use std::env;
use thiserror::Error;

const DEFAULT_PORT: u16 = 4030;
const DEFAULT_SHARD_DIR: &str = "./shards";
const DEFAULT_INDEX_DB_PATH: &str = "./schedule-index.db";
const DEFAULT_RATE_LIMIT_RPM: u32 = 120;
const DEFAULT_BEARER_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct ControlConfig {
    pub port: u16,
    /// Directory holding one SQLite file per user shard.
    pub shard_dir: String,
    /// SQLite-backed schedule index path; `None` uses the in-memory index.
    pub index_db_path: Option<String>,
    /// Signing key for client bearer tokens minted by `/auth/verify`.
    pub jwt_secret: Vec<u8>,
    /// Base URL of the executor bridge, used only to echo back a
    /// `contractAddress`-shaped response on `setup-recurring`; the
    /// Dispatcher is the one that actually calls the executor.
    pub allowed_origins: Vec<String>,
    pub rate_limit_rpm: u32,
    pub bearer_token_ttl_seconds: i64,
    /// Bearer token required for `/metrics` (`None` = publicly accessible
    /// only if `VOICEPAY_PUBLIC_METRICS=true`).
    pub metrics_token: Option<String>,
    /// URL of an external NL-intent parser; absent means the in-memory
    /// fake parser is used (tests, local runs).
    pub intent_parser_url: Option<String>,
}

impl std::fmt::Debug for ControlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlConfig")
            .field("port", &self.port)
            .field("shard_dir", &self.shard_dir)
            .field("index_db_path", &self.index_db_path)
            .field("jwt_secret", &"[REDACTED]")
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("bearer_token_ttl_seconds", &self.bearer_token_ttl_seconds)
            .field("metrics_token", &self.metrics_token.as_ref().map(|_| "[REDACTED]"))
            .field("intent_parser_url", &self.intent_parser_url)
            .finish()
    }
}

impl ControlConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::MissingRequired("JWT_SECRET"))?
            .into_bytes();
        if jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT_SECRET is shorter than 32 bytes — use `openssl rand -hex 32` to generate one"
            );
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let shard_dir = env::var("SHARD_DIR").unwrap_or_else(|_| DEFAULT_SHARD_DIR.to_string());

        let index_db_path = env::var("INDEX_DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some(DEFAULT_INDEX_DB_PATH.to_string()));

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        let bearer_token_ttl_seconds = env::var("BEARER_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BEARER_TOKEN_TTL_SECONDS);

        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics is only reachable via VOICEPAY_PUBLIC_METRICS=true");
        }

        let intent_parser_url = env::var("INTENT_PARSER_URL").ok().filter(|s| !s.is_empty());

        Ok(Self {
            port,
            shard_dir,
            index_db_path,
            jwt_secret,
            allowed_origins,
            rate_limit_rpm,
            bearer_token_ttl_seconds,
            metrics_token,
            intent_parser_url,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),
}
