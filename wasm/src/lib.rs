//! WebAssembly module for the Inventory Forecast Platform
//!
//! Provides client-side computation for:
//! - Full product recompute (immediate fields plus six-month projection)
//! - What-if simulation of incoming transit units
//! - Box rounding and period labels for the dashboard

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::forecast::*;
pub use shared::models::*;
pub use shared::types::*;

fn js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| js_error(format!("Invalid {} date '{}': {}", field, value, e)))
}

fn parse_product(product_json: &str) -> Result<ProductSnapshot, JsValue> {
    serde_json::from_str(product_json)
        .map_err(|e| js_error(format!("Invalid product JSON: {}", e)))
}

fn to_json(product: &ProductSnapshot) -> Result<String, JsValue> {
    serde_json::to_string(product)
        .map_err(|e| js_error(format!("Failed to serialize product: {}", e)))
}

/// Recompute every derived field of a product record
#[wasm_bindgen]
pub fn recompute_product(product_json: &str, anchor: &str, today: &str) -> Result<String, JsValue> {
    let mut product = parse_product(product_json)?;
    let ctx = ProjectionContext::new(parse_date("anchor", anchor)?, parse_date("today", today)?);

    recompute_immediate(&mut product, &ctx);
    recompute_projection(&mut product, &ctx);
    to_json(&product)
}

/// Preview the effect of `units` more units in transit without persisting
#[wasm_bindgen]
pub fn simulate_transit_units(
    product_json: &str,
    units: f64,
    anchor: &str,
    today: &str,
) -> Result<String, JsValue> {
    let units = shared::validation::quantity_from_f64("units", units)
        .map_err(|e| js_error(e.to_string()))?;
    let mut product = parse_product(product_json)?;
    let ctx = ProjectionContext::new(parse_date("anchor", anchor)?, parse_date("today", today)?);

    product.in_transit += units;
    product.sync_total_stock();
    recompute_immediate(&mut product, &ctx);
    recompute_projection(&mut product, &ctx);
    to_json(&product)
}

/// Whole boxes needed to cover a deficit
#[wasm_bindgen]
pub fn boxes_to_order(deficit: f64, units_per_box: f64) -> f64 {
    let deficit = Decimal::from_f64(deficit).unwrap_or_default();
    let units_per_box = Decimal::from_f64(units_per_box).unwrap_or_default();
    boxes_for_deficit(deficit, units_per_box)
        .to_f64()
        .unwrap_or_default()
}

/// Period label ("MAR-2025") for the month containing `date`
#[wasm_bindgen]
pub fn period_label_for(date: &str) -> Result<String, JsValue> {
    Ok(period_label(parse_date("period", date)?))
}

/// Period label for the current month in the browser's clock
#[wasm_bindgen]
pub fn current_period_label() -> String {
    let now = js_sys::Date::new_0();
    let date = NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, 1);
    date.map(period_label).unwrap_or_default()
}
