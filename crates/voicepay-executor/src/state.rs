use std::sync::Arc;
use voicepay_shard::ShardRegistry;

use crate::chain::ChainExecutor;
use crate::config::ExecutorConfig;

pub struct AppState {
    pub config: Arc<ExecutorConfig>,
    pub shards: Arc<ShardRegistry>,
    pub executor: Arc<dyn ChainExecutor>,
}
