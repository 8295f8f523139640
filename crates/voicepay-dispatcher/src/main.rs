use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicepay_dispatcher::{
    config::DispatcherConfig,
    guard::InFlightGuard,
    tick::{run_tick, FireOutcome, TickContext},
};
use voicepay_index::{ScheduleIndex, ScheduleIndexStore, SqliteScheduleIndex};
use voicepay_shard::ShardRegistry;

/// Rebuild the in-memory index from every schedule already on disk. Run
/// once at startup since the index does not otherwise survive a restart
/// (spec §4.2).
fn rehydrate_index(index: &dyn ScheduleIndexStore, shards: &ShardRegistry, shard_dir: &str) {
    let Ok(read_dir) = std::fs::read_dir(shard_dir) else {
        tracing::warn!(shard_dir, "shard directory not found, starting with an empty index");
        return;
    };

    let mut rehydrated = 0usize;
    for entry in read_dir.flatten() {
        let Some(address) = entry
            .file_name()
            .to_str()
            .and_then(|s| s.strip_suffix(".db"))
            .and_then(|s| s.parse().ok())
        else {
            continue;
        };
        let Ok(shard) = shards.get_or_open(address.clone()) else {
            continue;
        };
        let Ok(schedules) = shard.list_schedules() else {
            continue;
        };
        for schedule in schedules.into_iter().filter(|s| s.active) {
            index.put(voicepay_types::IndexEntry::from_schedule(address.clone(), &schedule));
            rehydrated += 1;
        }
    }
    tracing::info!(rehydrated, "rehydrated schedule index from shards");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DispatcherConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        interval_seconds = config.dispatch_interval_seconds,
        "starting voicepay-dispatcher"
    );

    let shards = Arc::new(ShardRegistry::new(config.shard_dir.clone()));
    let index: Arc<dyn ScheduleIndexStore> = match &config.index_db_path {
        Some(path) => Arc::new(SqliteScheduleIndex::open(path).expect("failed to open schedule index")),
        None => Arc::new(ScheduleIndex::default()),
    };
    rehydrate_index(index.as_ref(), &shards, &config.shard_dir);

    let ctx = TickContext {
        http_client: reqwest::Client::new(),
        executor_url: config.executor_url.clone(),
        hmac_shared_secret: config.hmac_shared_secret.clone(),
        dispatch_timeout: std::time::Duration::from_secs(config.dispatch_timeout_seconds),
        retry_backoff_seconds: config.retry_backoff_seconds,
        shards,
        index,
        in_flight: Arc::new(InFlightGuard::default()),
    };

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(config.dispatch_interval_seconds));
    loop {
        interval.tick().await;

        let outcomes = run_tick(&ctx).await;
        let (mut fired, mut skipped, mut failed) = (0usize, 0usize, 0usize);
        for outcome in &outcomes {
            match outcome {
                FireOutcome::Fired { schedule_id } => {
                    fired += 1;
                    tracing::debug!(%schedule_id, "fired");
                }
                FireOutcome::Skipped { schedule_id } => {
                    skipped += 1;
                    tracing::debug!(%schedule_id, "skipped: already in flight");
                }
                FireOutcome::Failed { schedule_id, reason } => {
                    failed += 1;
                    tracing::warn!(%schedule_id, reason, "fire failed, scheduled for retry");
                }
            }
        }
        if fired + skipped + failed > 0 {
            tracing::info!(fired, skipped, failed, "tick complete");
        }
    }
}
