//! Six-month stock rollforward

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{
    boxes_for_deficit, required_action, summarize, DemandModel, ProjectionContext,
    DEMAND_DAYS_PER_MONTH, PROJECTION_PERIODS,
};
use crate::models::{PendingOrder, PendingOrders, PeriodProjection, ProductSnapshot};
use crate::types::{days_in_month, month_start, period_label};

/// Key prefix for orders the rollforward schedules itself
pub const AUTO_ORDER_PREFIX: &str = "AUTO-";

/// Regenerate the projection array and summary metrics of `product`.
///
/// The product's own pending orders are read but never modified; the
/// rollforward works on a private copy.
pub fn recompute_projection(product: &mut ProductSnapshot, ctx: &ProjectionContext) {
    let periods = project(product, ctx);
    product.metrics = summarize(&periods);
    product.projections = periods;
}

/// Compute the forward projection without touching `product`
pub fn project(product: &ProductSnapshot, ctx: &ProjectionContext) -> Vec<PeriodProjection> {
    let config = &product.config;
    let demand = DemandModel::new(product.daily_consumption, &product.consumption_history);
    let units_per_box = product.units_per_box;
    let in_transit = product.in_transit;

    let mut pending = product.pending_orders.clone();
    let mut running_stock = product.total_stock;
    let mut periods = Vec::with_capacity(PROJECTION_PERIODS);
    let days_per_month = Decimal::from(DEMAND_DAYS_PER_MONTH);
    let max_coverage = Decimal::from(config.max_replenishment_days);

    for index in 0..PROJECTION_PERIODS {
        let start = month_start(ctx.anchor, index as u32);
        let label = period_label(start);

        let monthly = demand.monthly_estimate(start.month());
        let daily = monthly / days_per_month;

        let received = take_arrivals(&mut pending, &label);
        let opening = running_stock + received;
        let closing = (opening - monthly).max(Decimal::ZERO);
        let available = closing + in_transit;

        let safety_stock = daily * Decimal::from(config.safety_stock_days);
        let minimum_stock = monthly + safety_stock;
        let reorder_point = daily * Decimal::from(config.reorder_point_days);
        let deficit = (reorder_point - available).max(Decimal::ZERO);

        let transit_days = product.transit_days_for(index);
        let lead_days = config.lead_time_days + transit_days;

        let coverage = if daily > Decimal::ZERO {
            (available / daily).min(max_coverage)
        } else {
            Decimal::ZERO
        };

        let mut boxes = 0;
        let mut units = Decimal::ZERO;
        let mut dates = OrderDates::default();
        if deficit > Decimal::ZERO && daily > Decimal::ZERO {
            boxes = boxes_for_deficit(deficit, units_per_box);
            units = Decimal::from(boxes) * units_per_box;
            dates = OrderDates::for_period(start, coverage, lead_days);
            if units > Decimal::ZERO {
                let next_label = period_label(month_start(ctx.anchor, index as u32 + 1));
                schedule_order(&mut pending, next_label, units);
            }
        }

        periods.push(PeriodProjection {
            period: label,
            opening_stock: opening.round_dp(2),
            closing_stock: closing.round_dp(2),
            monthly_consumption: monthly,
            daily_consumption: daily.round_dp(2),
            safety_stock: safety_stock.round_dp(2),
            minimum_stock: minimum_stock.round_dp(2),
            reorder_point: reorder_point.round_dp(2),
            deficit: deficit.round_dp(2),
            boxes_to_order: boxes,
            units_to_order: units,
            units_in_transit: in_transit,
            pending_orders: pending.clone(),
            required_action: required_action(boxes),
            units_received: received,
            reposition_date: dates.reposition,
            request_date: dates.request,
            arrival_date: dates.arrival,
            coverage_days: coverage.round_dp(2),
            transit_days,
            stock_alert: closing < daily * Decimal::from(config.alarm_stock_days),
        });

        running_stock = closing;
    }

    periods
}

/// Remove and sum every pending order due in `label`
fn take_arrivals(pending: &mut PendingOrders, label: &str) -> Decimal {
    let mut received = Decimal::ZERO;
    pending.retain(|_, order| {
        if order.arrival_period.as_deref() == Some(label) {
            received += order.units;
            false
        } else {
            true
        }
    });
    received
}

fn schedule_order(pending: &mut PendingOrders, arrival_label: String, units: Decimal) {
    let key = format!("{}{}", AUTO_ORDER_PREFIX, arrival_label);
    pending
        .entry(key)
        .and_modify(|order| order.units += units)
        .or_insert_with(|| PendingOrder::new(units, arrival_label));
}

#[derive(Debug, Default)]
struct OrderDates {
    reposition: Option<NaiveDate>,
    request: Option<NaiveDate>,
    arrival: Option<NaiveDate>,
}

impl OrderDates {
    /// Reposition falls inside the period once coverage minus lead time runs
    /// out; the request goes out on the first day and lands `lead_days` later.
    fn for_period(start: NaiveDate, coverage: Decimal, lead_days: u32) -> Self {
        let last_offset = days_in_month(start).saturating_sub(1) as i64;
        let offset = (coverage - Decimal::from(lead_days))
            .max(Decimal::ZERO)
            .trunc()
            .to_i64()
            .unwrap_or(0)
            .min(last_offset);
        Self {
            reposition: Some(start + Duration::days(offset)),
            request: Some(start),
            arrival: Some(start + Duration::days(lead_days as i64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ProjectionContext {
        let anchor = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        ProjectionContext::new(anchor, anchor)
    }

    fn product() -> ProductSnapshot {
        let mut p = ProductSnapshot::new("SKU-7", "Papel bond");
        p.physical_stock = Decimal::from(500);
        p.total_stock = Decimal::from(500);
        p.units_per_box = Decimal::from(25);
        p.daily_consumption = Decimal::from(5);
        p
    }

    #[test]
    fn test_period_labels_follow_anchor() {
        let periods = project(&product(), &ctx());
        let labels: Vec<&str> = periods.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(
            labels,
            vec!["MAR-2025", "ABR-2025", "MAY-2025", "JUN-2025", "JUL-2025", "AGO-2025"]
        );
    }

    #[test]
    fn test_stock_rolls_forward() {
        let mut p = product();
        p.config.reorder_point_days = 0;
        let periods = project(&p, &ctx());
        // No history: 100 units per month, no orders ever raised
        assert_eq!(periods[0].opening_stock, Decimal::from(500));
        assert_eq!(periods[0].closing_stock, Decimal::from(400));
        assert_eq!(periods[1].opening_stock, Decimal::from(400));
        assert_eq!(periods[4].closing_stock, Decimal::ZERO);
        assert_eq!(periods[5].opening_stock, Decimal::ZERO);
        assert!(periods.iter().all(|period| period.boxes_to_order == 0));
    }

    #[test]
    fn test_pending_order_arrives_in_its_period() {
        let mut p = product();
        p.config.reorder_point_days = 0;
        p.pending_orders
            .insert("PO-1".into(), PendingOrder::new(Decimal::from(60), "ABR-2025"));
        let periods = project(&p, &ctx());

        assert!(periods[0].pending_orders.contains_key("PO-1"));
        assert_eq!(periods[1].units_received, Decimal::from(60));
        assert_eq!(periods[1].opening_stock, Decimal::from(460));
        assert!(!periods[1].pending_orders.contains_key("PO-1"));
        // Stored record is untouched
        assert!(p.pending_orders.contains_key("PO-1"));
    }

    #[test]
    fn test_deficit_schedules_order_for_next_period() {
        let mut p = product();
        p.total_stock = Decimal::from(120);
        let periods = project(&p, &ctx());

        // Period 0: closing 20, daily 5, reorder point 5 * 44 = 220
        let first = &periods[0];
        assert_eq!(first.closing_stock, Decimal::from(20));
        assert_eq!(first.reorder_point, Decimal::from(220));
        assert_eq!(first.deficit, Decimal::from(200));
        assert_eq!(first.boxes_to_order, 8);
        assert_eq!(first.units_to_order, Decimal::from(200));
        assert_eq!(first.required_action, "Pedir 8 cajas");
        assert_eq!(first.request_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(first.arrival_date, NaiveDate::from_ymd_opt(2025, 3, 21));
        assert!(first.stock_alert);

        let scheduled = first.pending_orders.get("AUTO-ABR-2025").unwrap();
        assert_eq!(scheduled.units, Decimal::from(200));

        assert_eq!(periods[1].units_received, Decimal::from(200));
        assert_eq!(periods[1].opening_stock, Decimal::from(220));
    }

    #[test]
    fn test_no_order_leaves_dates_not_applicable() {
        let mut p = product();
        p.total_stock = Decimal::from(100_000);
        let first = &project(&p, &ctx())[0];
        assert_eq!(first.boxes_to_order, 0);
        assert_eq!(first.required_action, "Stock suficiente");
        assert!(first.reposition_date.is_none());
        assert!(first.request_date.is_none());
        assert!(first.arrival_date.is_none());
        assert!(!first.stock_alert);
    }

    #[test]
    fn test_transit_override_shifts_arrival() {
        let mut p = product();
        p.total_stock = Decimal::from(120);
        p.transit_day_overrides.insert(0, 5);
        let first = &project(&p, &ctx())[0];
        assert_eq!(first.transit_days, 5);
        assert_eq!(first.arrival_date, NaiveDate::from_ymd_opt(2025, 3, 26));
    }

    #[test]
    fn test_zero_consumption_projection() {
        let mut p = product();
        p.daily_consumption = Decimal::ZERO;
        let periods = project(&p, &ctx());
        assert_eq!(periods.len(), PROJECTION_PERIODS);
        for period in &periods {
            assert_eq!(period.monthly_consumption, Decimal::ZERO);
            assert_eq!(period.coverage_days, Decimal::ZERO);
            assert_eq!(period.boxes_to_order, 0);
            assert!(!period.stock_alert);
        }
    }
}
