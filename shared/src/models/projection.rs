//! Forward projection models

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wire::{date_or_not_applicable, lenient_decimal};

/// A scheduled stock arrival
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingOrder {
    #[serde(rename = "unidades", default, deserialize_with = "lenient_decimal")]
    pub units: Decimal,

    /// Label of the period the units arrive in (`ABR-2025`)
    #[serde(rename = "periodo_llegada", default, skip_serializing_if = "Option::is_none")]
    pub arrival_period: Option<String>,
}

impl PendingOrder {
    pub fn new(units: Decimal, arrival_period: impl Into<String>) -> Self {
        Self {
            units,
            arrival_period: Some(arrival_period.into()),
        }
    }
}

/// Pending orders keyed by purchase-order id
pub type PendingOrders = IndexMap<String, PendingOrder>;

/// One forecasted month of stock, demand and ordering figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodProjection {
    #[serde(rename = "mes")]
    pub period: String,
    #[serde(rename = "stock_inicial")]
    pub opening_stock: Decimal,
    #[serde(rename = "stock_proyectado")]
    pub closing_stock: Decimal,
    #[serde(rename = "consumo_mensual")]
    pub monthly_consumption: Decimal,
    #[serde(rename = "consumo_diario")]
    pub daily_consumption: Decimal,
    #[serde(rename = "stock_seguridad")]
    pub safety_stock: Decimal,
    #[serde(rename = "stock_minimo")]
    pub minimum_stock: Decimal,
    #[serde(rename = "punto_reorden")]
    pub reorder_point: Decimal,
    pub deficit: Decimal,
    #[serde(rename = "cajas_a_pedir")]
    pub boxes_to_order: u64,
    #[serde(rename = "unidades_a_pedir")]
    pub units_to_order: Decimal,
    #[serde(rename = "unidades_en_transito")]
    pub units_in_transit: Decimal,
    /// Orders still outstanding once this period has been processed
    #[serde(rename = "pedidos_pendientes")]
    pub pending_orders: PendingOrders,
    #[serde(rename = "accion_requerida")]
    pub required_action: String,
    #[serde(rename = "pedidos_recibidos")]
    pub units_received: Decimal,
    #[serde(rename = "fecha_reposicion", with = "date_or_not_applicable")]
    pub reposition_date: Option<NaiveDate>,
    #[serde(rename = "fecha_solicitud", with = "date_or_not_applicable")]
    pub request_date: Option<NaiveDate>,
    #[serde(rename = "fecha_arribo", with = "date_or_not_applicable")]
    pub arrival_date: Option<NaiveDate>,
    #[serde(rename = "tiempo_cobertura")]
    pub coverage_days: Decimal,
    #[serde(rename = "dias_transito")]
    pub transit_days: u32,
    #[serde(rename = "alerta_stock")]
    pub stock_alert: bool,
}

/// Summary figures over a full projection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionMetrics {
    /// Periods whose closing stock is zero or below
    #[serde(rename = "periodos_sin_stock")]
    pub stockout_periods: usize,
    #[serde(rename = "unidades_totales_a_pedir")]
    pub total_units_to_order: Decimal,
    #[serde(rename = "cobertura_promedio")]
    pub average_coverage_days: Decimal,
    /// Coefficient of variation (stddev / mean) of monthly demand estimates
    #[serde(rename = "coeficiente_variacion")]
    pub demand_variation: Decimal,
}
