//! Transit adjustment service
//!
//! Every mutation follows the same discipline: take an owned copy of the
//! stored record together with its version, change the copy, recompute the
//! derived fields and publish it with `put`. Nothing is written when
//! validation fails, and a concurrent writer that got there first turns the
//! publish into a `Conflict` instead of a lost update.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    period_label, recompute_immediate, recompute_projection, replenishment_frequency,
    validate_projection_index, validate_quantity, validate_transit_days, PendingOrder,
    ProductSnapshot, ProductUpdate, ProjectionContext, ValidationError, PROJECTION_PERIODS,
};

use crate::error::AppResult;
use crate::store::{SnapshotStore, Version, Versioned};

/// Switches for a transit adjustment
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitOptions {
    /// Regenerate the six-month projection
    pub recalc_projections: bool,
    /// Refresh the replenishment frequency
    pub update_frequency: bool,
    /// Publish the result; when false the caller only gets a preview
    pub persist: bool,
    /// Record the units as this purchase order
    pub purchase_order_id: Option<String>,
    /// When the purchase order lands; defaults to the first projected month
    pub expected_arrival: Option<NaiveDate>,
}

impl Default for TransitOptions {
    fn default() -> Self {
        Self {
            recalc_projections: true,
            update_frequency: true,
            persist: true,
            purchase_order_id: None,
            expected_arrival: None,
        }
    }
}

/// Result of a per-period transit-day change
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionAdjustment {
    pub product: ProductSnapshot,
    pub affected_projections: usize,
}

/// Transit adjustment service
#[derive(Clone)]
pub struct TransitService {
    store: Arc<dyn SnapshotStore>,
    ctx: ProjectionContext,
}

impl TransitService {
    pub fn new(store: Arc<dyn SnapshotStore>, ctx: ProjectionContext) -> Self {
        Self { store, ctx }
    }

    /// Add `units` to the product's in-transit total
    pub async fn apply_transit_units(
        &self,
        code: &str,
        units: Decimal,
        options: TransitOptions,
    ) -> AppResult<ProductSnapshot> {
        let units = validate_quantity("units", units)?;
        let Versioned {
            value: mut product,
            version,
        } = self.store.get(code).await?;

        product.in_transit += units;
        product.sync_total_stock();

        if let Some(po_id) = options.purchase_order_id.as_deref().filter(|_| units > Decimal::ZERO) {
            let arrival = options.expected_arrival.unwrap_or(self.ctx.anchor);
            product
                .pending_orders
                .insert(po_id.to_string(), PendingOrder::new(units, period_label(arrival)));
        }

        self.refresh(&mut product, &options);
        tracing::info!(
            code = %code,
            units = %units,
            in_transit = %product.in_transit,
            purchase_order = ?options.purchase_order_id,
            "Transit units applied"
        );

        if options.persist {
            self.publish(code, &product, &version).await?;
        }
        Ok(product)
    }

    /// Set the global transit days for the product
    pub async fn apply_transit_days(
        &self,
        code: &str,
        days: i64,
        options: TransitOptions,
    ) -> AppResult<ProductSnapshot> {
        let days = validate_transit_days(days)?;
        let Versioned {
            value: mut product,
            version,
        } = self.store.get(code).await?;

        product.config.transit_days = days;
        self.refresh(&mut product, &options);
        tracing::info!(code = %code, days, "Transit days applied");

        if options.persist {
            self.publish(code, &product, &version).await?;
        }
        Ok(product)
    }

    /// Override transit days for projection period `index` and every later one
    pub async fn apply_transit_days_to_projection(
        &self,
        code: &str,
        index: i64,
        days: i64,
    ) -> AppResult<ProjectionAdjustment> {
        let index = validate_projection_index(index)?;
        let days = validate_transit_days(days)?;
        let Versioned {
            value: mut product,
            version,
        } = self.store.get(code).await?;

        for period in index..PROJECTION_PERIODS {
            product.transit_day_overrides.insert(period, days);
        }
        self.refresh(&mut product, &TransitOptions::default());

        let affected_projections = PROJECTION_PERIODS - index;
        tracing::info!(code = %code, index, days, affected_projections, "Projection transit days applied");

        self.publish(code, &product, &version).await?;
        Ok(ProjectionAdjustment {
            product,
            affected_projections,
        })
    }

    /// Merge a partial update and recompute everything
    pub async fn update_product(
        &self,
        code: &str,
        update: ProductUpdate,
    ) -> AppResult<ProductSnapshot> {
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        let Versioned {
            value: mut product,
            version,
        } = self.store.get(code).await?;

        update.apply_to(&mut product);
        product.sync_total_stock();
        recompute_immediate(&mut product, &self.ctx);
        recompute_projection(&mut product, &self.ctx);
        tracing::info!(code = %code, "Product updated");

        self.publish(code, &product, &version).await?;
        Ok(product)
    }

    fn refresh(&self, product: &mut ProductSnapshot, options: &TransitOptions) {
        recompute_immediate(product, &self.ctx);
        if options.recalc_projections {
            recompute_projection(product, &self.ctx);
        }
        if options.update_frequency {
            if let Some(frequency) = replenishment_frequency(product) {
                product.replenishment_frequency = frequency;
            }
        }
    }

    async fn publish(
        &self,
        code: &str,
        product: &ProductSnapshot,
        version: &Version,
    ) -> AppResult<()> {
        self.store.put(code, product.clone(), version).await?;
        Ok(())
    }
}
