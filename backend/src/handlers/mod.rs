//! HTTP handlers for the Inventory Forecast Platform

pub mod alert;
pub mod health;
pub mod predictions;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use alert::evaluate_stock_alert;
pub use health::health_check;
pub use predictions::{
    apply_transit_days, apply_transit_days_to_projection, apply_transit_units, export_report,
    get_prediction, list_predictions, refresh_predictions, update_prediction,
};

/// Response envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_projections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persisted: Option<bool>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata {
                timestamp: Utc::now(),
                count: None,
                affected_projections: None,
                persisted: None,
            },
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.metadata.count = Some(count);
        self
    }

    pub fn with_affected_projections(mut self, affected: usize) -> Self {
        self.metadata.affected_projections = Some(affected);
        self
    }

    pub fn with_persisted(mut self, persisted: bool) -> Self {
        self.metadata.persisted = Some(persisted);
        self
    }
}
