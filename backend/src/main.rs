//! Inventory Forecast Platform - Backend Server

use std::{net::SocketAddr, sync::Arc};

use forecast_server::{
    config::{Config, LogFormat},
    create_app, external, store::JsonFileStore, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "forecast_server=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(config.log.format);

    tracing::info!("Starting Inventory Forecast Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!(
        snapshot = %config.snapshot.path.display(),
        anchor = %config.projection.anchor_date,
        channel = ?config.notifications.channel,
        "Configuration loaded"
    );

    let store = Arc::new(JsonFileStore::new(config.snapshot.path.clone()));
    let notifier = external::build_notifier(&config.notifications)?;

    // Create application state
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(config, store, notifier);

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
