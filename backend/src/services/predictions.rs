//! Read-side service over the product snapshot: listing, lookup and the
//! per-product projection report

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{wire::NOT_APPLICABLE, PeriodProjection, ProductSnapshot};

use crate::error::{AppError, AppResult};
use crate::store::SnapshotStore;

/// One CSV row per projected month
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    codigo: &'a str,
    mes: &'a str,
    stock_inicial: Decimal,
    consumo_mensual: Decimal,
    pedidos_recibidos: Decimal,
    stock_proyectado: Decimal,
    punto_reorden: Decimal,
    deficit: Decimal,
    cajas_a_pedir: u64,
    unidades_a_pedir: Decimal,
    fecha_solicitud: String,
    fecha_arribo: String,
    tiempo_cobertura: Decimal,
    dias_transito: u32,
    alerta_stock: bool,
    accion_requerida: &'a str,
}

impl<'a> ReportRow<'a> {
    fn new(code: &'a str, period: &'a PeriodProjection) -> Self {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string())
        };
        Self {
            codigo: code,
            mes: &period.period,
            stock_inicial: period.opening_stock,
            consumo_mensual: period.monthly_consumption,
            pedidos_recibidos: period.units_received,
            stock_proyectado: period.closing_stock,
            punto_reorden: period.reorder_point,
            deficit: period.deficit,
            cajas_a_pedir: period.boxes_to_order,
            unidades_a_pedir: period.units_to_order,
            fecha_solicitud: date(period.request_date),
            fecha_arribo: date(period.arrival_date),
            tiempo_cobertura: period.coverage_days,
            dias_transito: period.transit_days,
            alerta_stock: period.stock_alert,
            accion_requerida: &period.required_action,
        }
    }
}

/// Prediction query service
#[derive(Clone)]
pub struct PredictionService {
    store: Arc<dyn SnapshotStore>,
}

impl PredictionService {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<ProductSnapshot>> {
        self.store.read_all().await
    }

    pub async fn get(&self, code: &str) -> AppResult<ProductSnapshot> {
        Ok(self.store.get(code).await?.into_inner())
    }

    /// CSV export of the stored projection for `code`
    pub async fn export_csv(&self, code: &str) -> AppResult<String> {
        let product = self.get(code).await?;
        projection_csv(&product)
    }
}

/// Render a product's projection periods as CSV
pub fn projection_csv(product: &ProductSnapshot) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for period in &product.projections {
        wtr.serialize(ReportRow::new(&product.code, period))
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
