//! Environment-driven configuration for the Executor Bridge, following the
//! same `from_env` shape as `voicepay-control::config`.

use std::env;
use thiserror::Error;

const DEFAULT_PORT: u16 = 4031;
const DEFAULT_HMAC_CLOCK_SKEW_SECONDS: i64 = 300;

#[derive(Clone)]
pub struct ExecutorConfig {
    pub port: u16,
    /// Shared secret authenticating Dispatcher → Executor Bridge calls.
    pub hmac_shared_secret: Vec<u8>,
    /// Signing key for the process-wide executor account (never leaves
    /// this process — the Dispatcher never holds it, spec §5).
    pub executor_private_key: String,
    pub rpc_url: String,
    pub recurring_contract: String,
    pub usdc_address: String,
    pub hmac_clock_skew_seconds: i64,
    pub shard_dir: String,
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ExecutorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorConfig")
            .field("port", &self.port)
            .field("hmac_shared_secret", &"[REDACTED]")
            .field("executor_private_key", &"[REDACTED]")
            .field("rpc_url", &self.rpc_url)
            .field("recurring_contract", &self.recurring_contract)
            .field("usdc_address", &self.usdc_address)
            .field("hmac_clock_skew_seconds", &self.hmac_clock_skew_seconds)
            .field("shard_dir", &self.shard_dir)
            .field("metrics_token", &self.metrics_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ExecutorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let hmac_shared_secret = env::var("HMAC_SHARED_SECRET")
            .map_err(|_| ConfigError::MissingRequired("HMAC_SHARED_SECRET"))?
            .into_bytes();
        let executor_private_key = env::var("EXECUTOR_PRIVATE_KEY")
            .map_err(|_| ConfigError::MissingRequired("EXECUTOR_PRIVATE_KEY"))?;
        let rpc_url = env::var("RPC_URL").map_err(|_| ConfigError::MissingRequired("RPC_URL"))?;
        let recurring_contract = env::var("RECURRING_CONTRACT")
            .map_err(|_| ConfigError::MissingRequired("RECURRING_CONTRACT"))?;
        let usdc_address =
            env::var("USDC_ADDRESS").map_err(|_| ConfigError::MissingRequired("USDC_ADDRESS"))?;

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let hmac_clock_skew_seconds = env::var("HMAC_CLOCK_SKEW_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HMAC_CLOCK_SKEW_SECONDS);

        let shard_dir = env::var("SHARD_DIR").unwrap_or_else(|_| "./shards".to_string());
        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());

        Ok(Self {
            port,
            hmac_shared_secret,
            executor_private_key,
            rpc_url,
            recurring_contract,
            usdc_address,
            hmac_clock_skew_seconds,
            shard_dir,
            metrics_token,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),
}
