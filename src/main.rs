use collaborate_rs::config::Config;
use collaborate_rs::store::RedisStore;
use collaborate_rs::types::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("tower_http", tracing_subscriber::filter::LevelFilter::DEBUG),
            ("collaborate_rs", tracing_subscriber::filter::LevelFilter::DEBUG),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env()?;
    let store = Arc::new(RedisStore::open(&config.redis_url)?);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app_state = Arc::new(AppState::new(config, store));

    info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(collaborate_rs::app(app_state).into_make_service())
        .await?;
    Ok(())
}
