//! Projection summary metrics

use rust_decimal::{Decimal, MathematicalOps};

use crate::models::{PeriodProjection, ProjectionMetrics};

/// Summarize a projection: stockout periods, total units to order, average
/// coverage and the coefficient of variation of monthly demand.
pub fn summarize(periods: &[PeriodProjection]) -> ProjectionMetrics {
    if periods.is_empty() {
        return ProjectionMetrics::default();
    }
    let count = Decimal::from(periods.len());

    let stockout_periods = periods
        .iter()
        .filter(|p| p.closing_stock <= Decimal::ZERO)
        .count();
    let total_units_to_order = periods.iter().map(|p| p.units_to_order).sum::<Decimal>();
    let average_coverage_days = periods.iter().map(|p| p.coverage_days).sum::<Decimal>() / count;

    let demand: Vec<Decimal> = periods.iter().map(|p| p.monthly_consumption).collect();

    ProjectionMetrics {
        stockout_periods,
        total_units_to_order: total_units_to_order.round_dp(2),
        average_coverage_days: average_coverage_days.round_dp(2),
        demand_variation: coefficient_of_variation(&demand),
    }
}

/// Population stddev over mean; 0 for fewer than two samples or a zero mean
fn coefficient_of_variation(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let n = Decimal::from(values.len());
    let mean = values.iter().sum::<Decimal>() / n;
    if mean.is_zero() {
        return Decimal::ZERO;
    }
    let variance = values
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<Decimal>()
        / n;
    variance
        .sqrt()
        .map(|stddev| (stddev / mean).round_dp(4))
        .unwrap_or(Decimal::ZERO)
}
