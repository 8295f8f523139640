use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voicepay_executor::{
    chain::AlloyChainExecutor,
    config::ExecutorConfig,
    routes,
    state::AppState,
};
use voicepay_shard::ShardRegistry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ExecutorConfig::from_env().expect("failed to load configuration");
    let port = config.port;

    let contract_address: alloy::primitives::Address = config
        .recurring_contract
        .parse()
        .expect("invalid RECURRING_CONTRACT");

    tracing::info!("starting voicepay-executor on port {port}");

    let executor = AlloyChainExecutor::new(&config.executor_private_key, &config.rpc_url, contract_address)
        .expect("failed to initialize chain executor");

    let shards = Arc::new(ShardRegistry::new(config.shard_dir.clone()));
    let state = AppState {
        config: Arc::new(config),
        shards,
        executor: Arc::new(executor),
    };
    let state_data = web::Data::new(state);

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(60)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(Logger::default())
            .wrap(Governor::new(&governor_conf))
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
