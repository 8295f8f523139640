use std::env;
use thiserror::Error;

const DEFAULT_DISPATCH_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_DISPATCH_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_BACKOFF_SECONDS: i64 = 600;

#[derive(Clone)]
pub struct DispatcherConfig {
    pub executor_url: String,
    pub hmac_shared_secret: Vec<u8>,
    pub shard_dir: String,
    pub index_db_path: Option<String>,
    pub dispatch_interval_seconds: u64,
    pub dispatch_timeout_seconds: u64,
    pub retry_backoff_seconds: i64,
}

impl std::fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("executor_url", &self.executor_url)
            .field("hmac_shared_secret", &"[REDACTED]")
            .field("shard_dir", &self.shard_dir)
            .field("index_db_path", &self.index_db_path)
            .field("dispatch_interval_seconds", &self.dispatch_interval_seconds)
            .field("dispatch_timeout_seconds", &self.dispatch_timeout_seconds)
            .field("retry_backoff_seconds", &self.retry_backoff_seconds)
            .finish()
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let executor_url =
            env::var("EXECUTOR_URL").map_err(|_| ConfigError::MissingRequired("EXECUTOR_URL"))?;
        let hmac_shared_secret = env::var("HMAC_SHARED_SECRET")
            .map_err(|_| ConfigError::MissingRequired("HMAC_SHARED_SECRET"))?
            .into_bytes();

        let shard_dir = env::var("SHARD_DIR").unwrap_or_else(|_| "./shards".to_string());
        let index_db_path = env::var("INDEX_DB_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| Some("./schedule-index.db".to_string()));

        let dispatch_interval_seconds = env::var("DISPATCH_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DISPATCH_INTERVAL_SECONDS);
        let dispatch_timeout_seconds = env::var("DISPATCH_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DISPATCH_TIMEOUT_SECONDS);
        let retry_backoff_seconds = env::var("RETRY_BACKOFF_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRY_BACKOFF_SECONDS);

        Ok(Self {
            executor_url,
            hmac_shared_secret,
            shard_dir,
            index_db_path,
            dispatch_interval_seconds,
            dispatch_timeout_seconds,
            retry_backoff_seconds,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),
}
