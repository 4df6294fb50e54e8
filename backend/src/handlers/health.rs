//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub snapshot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check the snapshot is readable
    let (snapshot, products) = match state.store.read_all().await {
        Ok(products) => ("available".to_string(), Some(products.len())),
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot unavailable");
            ("unavailable".to_string(), None)
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        snapshot,
        products,
    })
}
