//! Route definitions for the Inventory Forecast Platform

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/predictions", prediction_routes(max_upload_bytes))
        .nest("/alerts", alert_routes())
}

/// Prediction query and adjustment routes
fn prediction_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_predictions))
        .route(
            "/refresh",
            post(handlers::refresh_predictions)
                // Multipart framing on top of the file itself
                .layer(DefaultBodyLimit::max(max_upload_bytes + 64 * 1024)),
        )
        .route(
            "/:code",
            get(handlers::get_prediction).patch(handlers::update_prediction),
        )
        .route("/:code/report.csv", get(handlers::export_report))
        .route("/:code/transit", post(handlers::apply_transit_units))
        .route("/:code/transit-days", post(handlers::apply_transit_days))
        .route(
            "/:code/projections/:index/transit-days",
            post(handlers::apply_transit_days_to_projection),
        )
}

/// Stock alert routes
fn alert_routes() -> Router<AppState> {
    Router::new().route("/stock", post(handlers::evaluate_stock_alert))
}
