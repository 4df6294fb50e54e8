//! HTTP handler for stock alert evaluation

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::services::{AlertOutcome, AlertService};
use crate::AppState;

/// Input for an alert evaluation
#[derive(Debug, Deserialize, Validate)]
pub struct AlertRequest {
    #[validate(length(min = 1, message = "Product code is required"))]
    pub code: String,

    #[validate(email(message = "Invalid e-mail format"))]
    pub email: String,

    #[serde(default)]
    pub is_manual: bool,
}

/// Result of an alert evaluation
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub code: String,
    #[serde(flatten)]
    pub outcome: AlertOutcome,
    pub is_manual: bool,
    /// Whether the caller may force a manual re-send
    pub can_resend: bool,
}

/// Evaluate a product and notify if its stock needs attention
pub async fn evaluate_stock_alert(
    State(state): State<AppState>,
    Json(input): Json<AlertRequest>,
) -> AppResult<Json<ApiResponse<AlertResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = AlertService::new(
        state.store.clone(),
        state.notifier.clone(),
        state.alert_ledger.clone(),
        state.config.alerts.coverage_threshold_days,
    );
    let outcome = service
        .evaluate(&input.code, &input.email, input.is_manual, Utc::now())
        .await?;

    let can_resend = match outcome {
        AlertOutcome::AlreadySent => true,
        AlertOutcome::Failed { .. } => !input.is_manual,
        AlertOutcome::NotRequired | AlertOutcome::Sent { .. } => false,
    };

    Ok(Json(ApiResponse::ok(AlertResponse {
        code: input.code,
        outcome,
        is_manual: input.is_manual,
        can_resend,
    })))
}
