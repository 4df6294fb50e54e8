//! Blended monthly demand estimate

use indexmap::IndexMap;
use rust_decimal::Decimal;

use super::DEMAND_DAYS_PER_MONTH;
use crate::types::month_from_label;

/// Demand estimator for a single product.
///
/// The monthly estimate blends the average consumption recorded for the same
/// calendar month in prior years (60%) with the base monthly rate scaled by the
/// recent trend (40%), and never drops below half the untrended base.
#[derive(Debug, Clone)]
pub struct DemandModel<'a> {
    history: &'a IndexMap<String, Decimal>,
    base: Decimal,
    trend: Decimal,
}

impl<'a> DemandModel<'a> {
    pub fn new(daily_consumption: Decimal, history: &'a IndexMap<String, Decimal>) -> Self {
        Self {
            history,
            base: daily_consumption.max(Decimal::ZERO) * Decimal::from(DEMAND_DAYS_PER_MONTH),
            trend: Self::trend_factor(history),
        }
    }

    /// Untrended monthly rate
    pub fn base(&self) -> Decimal {
        self.base
    }

    /// Trend multiplier in effect
    pub fn trend(&self) -> Decimal {
        self.trend
    }

    /// Relative change between the two most recent history values,
    /// as a multiplier clamped to [0.5, 1.5]. Neutral (1) without a usable pair.
    pub fn trend_factor(history: &IndexMap<String, Decimal>) -> Decimal {
        let len = history.len();
        if len < 2 {
            return Decimal::ONE;
        }
        let (Some((_, previous)), Some((_, last))) =
            (history.get_index(len - 2), history.get_index(len - 1))
        else {
            return Decimal::ONE;
        };
        if *previous <= Decimal::ZERO {
            return Decimal::ONE;
        }
        let growth = (last - previous) / previous;
        (Decimal::ONE + growth).clamp(Decimal::new(5, 1), Decimal::new(15, 1))
    }

    /// Average of every history entry recorded for `month` (1-based)
    pub fn same_month_average(&self, month: u32) -> Option<Decimal> {
        let values: Vec<Decimal> = self
            .history
            .iter()
            .filter(|(label, _)| month_from_label(label) == Some(month))
            .map(|(_, value)| *value)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
        }
    }

    /// Monthly demand estimate for calendar `month`, rounded to cents
    pub fn monthly_estimate(&self, month: u32) -> Decimal {
        let historical = self.same_month_average(month).unwrap_or(self.base);
        let trended = self.base * self.trend;
        let blended = Decimal::new(6, 1) * historical + Decimal::new(4, 1) * trended;
        let floor = self.base * Decimal::new(5, 1);
        blended.max(floor).round_dp(2)
    }
}
