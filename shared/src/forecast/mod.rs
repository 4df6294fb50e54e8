//! Stock projection engine
//!
//! Two entry points recompute the derived state of a [`ProductSnapshot`]:
//!
//! - [`recompute_immediate`] refreshes deficit, order quantities, coverage and
//!   the next reorder date from the current stock position.
//! - [`recompute_projection`] regenerates the six-month forward projection and
//!   its summary metrics.
//!
//! Both are total over well-formed records: zero consumption, a missing
//! history or a zero box size fall back to documented defaults instead of
//! failing. Neither reads the clock; the caller supplies a
//! [`ProjectionContext`].
//!
//! [`ProductSnapshot`]: crate::models::ProductSnapshot

mod demand;
mod immediate;
mod metrics;
mod rollforward;

use chrono::NaiveDate;

pub use demand::DemandModel;
pub use immediate::{boxes_for_deficit, recompute_immediate, replenishment_frequency};
pub use metrics::summarize;
pub use rollforward::{project, recompute_projection, AUTO_ORDER_PREFIX};

use crate::types::first_of_month;

/// Number of forward periods in every projection
pub const PROJECTION_PERIODS: usize = 6;

/// Working days used to turn a monthly estimate into daily demand
pub const DEMAND_DAYS_PER_MONTH: u32 = 20;

/// Action text when a period needs no order
pub const ACTION_STOCK_SUFFICIENT: &str = "Stock suficiente";

/// Dates the engine needs from the outside world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionContext {
    /// First day of the first projected month
    pub anchor: NaiveDate,
    /// Reference date for the immediate reorder date
    pub today: NaiveDate,
}

impl ProjectionContext {
    pub fn new(anchor: NaiveDate, today: NaiveDate) -> Self {
        Self {
            anchor: first_of_month(anchor),
            today,
        }
    }
}

/// Human-readable action for a period
pub fn required_action(boxes_to_order: u64) -> String {
    if boxes_to_order > 0 {
        format!("Pedir {} cajas", boxes_to_order)
    } else {
        ACTION_STOCK_SUFFICIENT.to_string()
    }
}
