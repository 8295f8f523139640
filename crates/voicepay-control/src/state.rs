//! Shared application state, following the teacher's `AppState` shape: one
//! struct of `Arc`-wrapped handles, cloned cheaply into every handler via
//! `web::Data`.

use std::sync::Arc;
use voicepay_index::{IndexError, ScheduleIndex, ScheduleIndexStore, SqliteScheduleIndex};
use voicepay_shard::ShardRegistry;

use crate::config::ControlConfig;
use crate::resolver::{ExternalIntentParser, FakeIntentParser, IntentParser};

pub struct AppState {
    pub config: Arc<ControlConfig>,
    pub shards: Arc<ShardRegistry>,
    pub index: Arc<dyn ScheduleIndexStore>,
    pub intent_parser: Arc<dyn IntentParser>,
}

impl AppState {
    pub fn new(config: ControlConfig) -> Result<Self, IndexError> {
        let shards = Arc::new(ShardRegistry::new(config.shard_dir.clone()));

        let index: Arc<dyn ScheduleIndexStore> = match &config.index_db_path {
            Some(path) => Arc::new(SqliteScheduleIndex::open(path)?),
            None => Arc::new(ScheduleIndex::default()),
        };

        let intent_parser: Arc<dyn IntentParser> = match &config.intent_parser_url {
            Some(url) => Arc::new(ExternalIntentParser::new(url.clone())),
            None => Arc::new(FakeIntentParser),
        };

        Ok(Self {
            config: Arc::new(config),
            shards,
            index,
            intent_parser,
        })
    }
}
