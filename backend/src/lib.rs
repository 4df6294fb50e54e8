//! Inventory Forecast Platform - Backend Server
//!
//! Serves product stock predictions, applies transit adjustments and sends
//! stock alerts. The binary in `main.rs` wires configuration and logging;
//! everything else lives here so integration tests can build the router.

use std::sync::Arc;

use axum::{routing::get, Router};
use chrono::Utc;
use shared::ProjectionContext;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use crate::external::Notifier;
use crate::services::AlertLedger;
use crate::store::SnapshotStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SnapshotStore>,
    pub notifier: Arc<dyn Notifier>,
    pub alert_ledger: Arc<AlertLedger>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ttl = chrono::Duration::hours(config.alerts.dedup_ttl_hours);
        Self {
            config: Arc::new(config),
            store,
            notifier,
            alert_ledger: Arc::new(AlertLedger::new(ttl)),
        }
    }

    /// Anchor month from configuration, today from the clock
    pub fn projection_context(&self) -> ProjectionContext {
        ProjectionContext::new(self.config.projection.anchor_date, Utc::now().date_naive())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config.ingestion.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventory Forecast Platform API v1.0"
}
