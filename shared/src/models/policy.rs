//! Replenishment policy constants attached to each product

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::wire::lenient_u32;

/// Named day-count constants that drive stock policy for one product.
///
/// Every field degrades to 0 when missing; keys the ingestion job adds that
/// are not modelled here (e.g. a model version tag) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(rename = "DIAS_STOCK_SEGURIDAD", default, deserialize_with = "lenient_u32")]
    pub safety_stock_days: u32,

    #[serde(rename = "DIAS_PUNTO_REORDEN", default, deserialize_with = "lenient_u32")]
    pub reorder_point_days: u32,

    #[serde(rename = "LEAD_TIME_REPOSICION", default, deserialize_with = "lenient_u32")]
    pub lead_time_days: u32,

    #[serde(rename = "DIAS_MAX_REPOSICION", default, deserialize_with = "lenient_u32")]
    pub max_replenishment_days: u32,

    #[serde(rename = "DIAS_ALARMA_STOCK", default, deserialize_with = "lenient_u32")]
    pub alarm_stock_days: u32,

    #[serde(rename = "DIAS_LABORALES_MES", default, deserialize_with = "lenient_u32")]
    pub working_days_per_month: u32,

    /// Transit days applied to every period unless overridden per period
    #[serde(rename = "DIAS_TRANSITO", default, deserialize_with = "lenient_u32")]
    pub transit_days: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PolicyConfig {
    /// Policy the ingestion job writes for every product by default
    pub fn standard() -> Self {
        Self {
            safety_stock_days: 19,
            reorder_point_days: 44,
            lead_time_days: 20,
            max_replenishment_days: 22,
            alarm_stock_days: 22,
            working_days_per_month: 22,
            transit_days: 0,
            extra: Map::new(),
        }
    }
}
