//! Immediate derived fields from the current stock position

use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::ProjectionContext;
use crate::models::ProductSnapshot;

/// Whole boxes needed to cover `deficit`; 0 when nothing is short or the box
/// size is unknown
pub fn boxes_for_deficit(deficit: Decimal, units_per_box: Decimal) -> u64 {
    if deficit <= Decimal::ZERO || units_per_box <= Decimal::ZERO {
        return 0;
    }
    (deficit / units_per_box).ceil().to_u64().unwrap_or(0)
}

/// Days between replenishments at the current rate, capped by policy
pub fn replenishment_frequency(product: &ProductSnapshot) -> Option<Decimal> {
    if product.daily_consumption <= Decimal::ZERO {
        return None;
    }
    let days = product.reorder_point / product.daily_consumption;
    let cap = Decimal::from(product.config.max_replenishment_days);
    Some(days.min(cap).round_dp(2))
}

/// Refresh deficit, order quantities, coverage days and the reorder date.
///
/// When the policy defines reorder-point days and the product consumes stock,
/// the reorder point is re-derived as `daily × days` first.
pub fn recompute_immediate(product: &mut ProductSnapshot, ctx: &ProjectionContext) {
    product.sync_total_stock();

    let daily = product.daily_consumption;
    let config = &product.config;
    if config.reorder_point_days > 0 && daily > Decimal::ZERO {
        product.reorder_point = (daily * Decimal::from(config.reorder_point_days)).round_dp(2);
    }

    let available = product.available_stock();
    let deficit = (product.reorder_point - available).max(Decimal::ZERO);
    product.deficit = deficit.round_dp(2);

    let boxes = boxes_for_deficit(deficit, product.units_per_box);
    product.boxes_to_order = boxes;
    product.units_to_order = Decimal::from(boxes) * product.units_per_box.max(Decimal::ZERO);

    if daily > Decimal::ZERO {
        let max_days = Decimal::from(product.config.max_replenishment_days);
        product.coverage_days = (available / daily).min(max_days).round_dp(2);

        let days_until_reorder = deficit / daily;
        let lead = Decimal::from(product.config.lead_time_days + product.config.transit_days);
        let offset = (days_until_reorder - lead)
            .max(Decimal::ZERO)
            .trunc()
            .to_i64()
            .unwrap_or(0);
        product.reorder_date = Some(ctx.today + Duration::days(offset));
    } else {
        product.coverage_days = Decimal::ZERO;
        product.reorder_date = None;
    }
}
