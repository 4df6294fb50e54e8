//! Product snapshot model
//!
//! One record per SKU, as written by the spreadsheet ingestion job. Field names
//! on the wire are the job's upper-case keys; anything the job emits that is
//! not modelled here is preserved in `extra` so a read-modify-write cycle never
//! drops data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::policy::PolicyConfig;
use super::projection::{PendingOrder, PendingOrders, PeriodProjection, ProjectionMetrics};
use super::wire::{date_or_not_applicable, lenient_decimal, lenient_series, lenient_u64};
use crate::validation::ValidationError;

/// Stock, demand and forecast state for one product code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(rename = "CODIGO")]
    pub code: String,

    #[serde(rename = "DESCRIPCION", default)]
    pub description: String,

    #[serde(
        rename = "FECHA_INICIO",
        default,
        with = "date_or_not_applicable",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,

    // Stock state
    #[serde(rename = "STOCK_FISICO", default, deserialize_with = "lenient_decimal")]
    pub physical_stock: Decimal,

    #[serde(
        rename = "UNIDADES_TRANSITO",
        alias = "UNIDADES_TRANSITO_DISPONIBLES",
        default,
        deserialize_with = "lenient_decimal"
    )]
    pub in_transit: Decimal,

    #[serde(rename = "STOCK_TOTAL", default, deserialize_with = "lenient_decimal")]
    pub total_stock: Decimal,

    #[serde(rename = "UNIDADES_POR_CAJA", default, deserialize_with = "lenient_decimal")]
    pub units_per_box: Decimal,

    // Demand parameters
    #[serde(rename = "CONSUMO_DIARIO", default, deserialize_with = "lenient_decimal")]
    pub daily_consumption: Decimal,

    #[serde(rename = "STOCK_SEGURIDAD", default, deserialize_with = "lenient_decimal")]
    pub safety_stock: Decimal,

    #[serde(rename = "STOCK_MINIMO", default, deserialize_with = "lenient_decimal")]
    pub minimum_stock: Decimal,

    #[serde(rename = "PUNTO_REORDEN", default, deserialize_with = "lenient_decimal")]
    pub reorder_point: Decimal,

    /// Consumed quantity per historical period, oldest first
    #[serde(rename = "HISTORICO_CONSUMOS", default, deserialize_with = "lenient_series")]
    pub consumption_history: IndexMap<String, Decimal>,

    #[serde(rename = "CONFIGURACION", default)]
    pub config: PolicyConfig,

    // Derived fields, recomputed on every mutation
    #[serde(rename = "DEFICIT", default, deserialize_with = "lenient_decimal")]
    pub deficit: Decimal,

    #[serde(rename = "CAJAS_A_PEDIR", default, deserialize_with = "lenient_u64")]
    pub boxes_to_order: u64,

    #[serde(rename = "UNIDADES_A_PEDIR", default, deserialize_with = "lenient_decimal")]
    pub units_to_order: Decimal,

    #[serde(rename = "DIAS_COBERTURA", default, deserialize_with = "lenient_decimal")]
    pub coverage_days: Decimal,

    #[serde(rename = "FECHA_REPOSICION", default, with = "date_or_not_applicable")]
    pub reorder_date: Option<NaiveDate>,

    #[serde(rename = "FRECUENCIA_REPOSICION", default, deserialize_with = "lenient_decimal")]
    pub replenishment_frequency: Decimal,

    #[serde(rename = "PEDIDOS_PENDIENTES", default)]
    pub pending_orders: PendingOrders,

    /// Transit-day overrides by projection index
    #[serde(
        rename = "DIAS_TRANSITO_PERIODOS",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub transit_day_overrides: BTreeMap<usize, u32>,

    #[serde(rename = "PROYECCIONES", default)]
    pub projections: Vec<PeriodProjection>,

    #[serde(rename = "METRICAS_PROYECCION", default)]
    pub metrics: ProjectionMetrics,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductSnapshot {
    /// Minimal record with the standard policy, used by the simulator and tests
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            config: PolicyConfig::standard(),
            ..Default::default()
        }
    }

    /// Physical plus in-transit units
    pub fn available_stock(&self) -> Decimal {
        self.physical_stock + self.in_transit
    }

    /// Re-establish `total = physical + in-transit`
    pub fn sync_total_stock(&mut self) {
        self.total_stock = self.available_stock();
    }

    /// Transit days in effect for the projection period at `index`
    pub fn transit_days_for(&self, index: usize) -> u32 {
        self.transit_day_overrides
            .get(&index)
            .copied()
            .unwrap_or(self.config.transit_days)
    }
}

/// Wire keys a partial update may never touch
pub const PROTECTED_FIELDS: [&str; 3] = ["CODIGO", "STOCK_FISICO", "CONFIGURACION"];

/// Partial update of the fields a caller may legally change.
///
/// Code, physical stock and the policy block are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    #[serde(rename = "DESCRIPCION")]
    pub description: Option<String>,

    #[serde(rename = "UNIDADES_TRANSITO", alias = "UNIDADES_TRANSITO_DISPONIBLES")]
    pub in_transit: Option<Decimal>,

    #[serde(rename = "UNIDADES_POR_CAJA")]
    pub units_per_box: Option<Decimal>,

    #[serde(rename = "CONSUMO_DIARIO")]
    pub daily_consumption: Option<Decimal>,

    #[serde(rename = "PUNTO_REORDEN")]
    pub reorder_point: Option<Decimal>,

    #[serde(rename = "HISTORICO_CONSUMOS")]
    pub consumption_history: Option<IndexMap<String, Decimal>>,

    #[serde(rename = "PEDIDOS_PENDIENTES")]
    pub pending_orders: Option<IndexMap<String, PendingOrder>>,
}

impl ProductUpdate {
    /// Parse a raw JSON payload, rejecting protected and unknown keys
    pub fn from_json(payload: Value) -> Result<Self, ValidationError> {
        let object = match &payload {
            Value::Object(map) => map,
            _ => return Err(ValidationError::MalformedUpdate("expected a JSON object".into())),
        };

        if let Some(field) = PROTECTED_FIELDS.iter().find(|f| object.contains_key(**f)) {
            return Err(ValidationError::ProtectedField((*field).to_string()));
        }
        if object.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }

        let update: ProductUpdate = serde_json::from_value(payload)
            .map_err(|e| ValidationError::MalformedUpdate(e.to_string()))?;
        update.validate()?;
        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self == &ProductUpdate::default()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        let quantities = [
            ("UNIDADES_TRANSITO", self.in_transit),
            ("UNIDADES_POR_CAJA", self.units_per_box),
            ("CONSUMO_DIARIO", self.daily_consumption),
            ("PUNTO_REORDEN", self.reorder_point),
        ];
        for (field, value) in quantities {
            if let Some(v) = value {
                crate::validation::validate_quantity(field, v)?;
            }
        }
        Ok(())
    }

    /// Merge the present fields into `product`
    pub fn apply_to(self, product: &mut ProductSnapshot) {
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(in_transit) = self.in_transit {
            product.in_transit = in_transit;
        }
        if let Some(units_per_box) = self.units_per_box {
            product.units_per_box = units_per_box;
        }
        if let Some(daily) = self.daily_consumption {
            product.daily_consumption = daily;
        }
        if let Some(reorder_point) = self.reorder_point {
            product.reorder_point = reorder_point;
        }
        if let Some(history) = self.consumption_history {
            product.consumption_history = history;
        }
        if let Some(pending) = self.pending_orders {
            product.pending_orders = pending;
        }
    }
}
