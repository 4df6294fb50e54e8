//! Transit adjustment tests
//!
//! Tests for the adjustment handler including:
//! - cumulative transit units and purchase-order bookkeeping
//! - a zero-unit adjustment leaves stock totals untouched
//! - per-period transit days and index bounds
//! - partial updates and protected fields
//! - nothing is written when an adjustment is rejected

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use forecast_server::error::AppError;
use forecast_server::services::{TransitOptions, TransitService};
use forecast_server::store::SnapshotStore;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use shared::{ProductUpdate, PROJECTION_PERIODS};

use common::{computed_product, context, product, seeded_store};

fn service(store: Arc<dyn SnapshotStore>) -> TransitService {
    TransitService::new(store, context())
}

// ============================================================================
// Transit Units
// ============================================================================

#[cfg(test)]
mod transit_units_tests {
    use super::*;

    /// Units add to the existing in-transit total and are persisted
    #[tokio::test]
    async fn test_units_are_cumulative() {
        let mut seeded = product("A", 30);
        seeded.in_transit = Decimal::from(5);
        let (_dir, store) = seeded_store(vec![seeded]).await;
        let service = service(store.clone());

        let updated = service
            .apply_transit_units("A", Decimal::from(15), TransitOptions::default())
            .await
            .unwrap();
        assert_eq!(updated.in_transit, Decimal::from(20));
        assert_eq!(updated.total_stock, Decimal::from(50));
        assert_eq!(updated.deficit, Decimal::ZERO);
        assert_eq!(updated.projections.len(), PROJECTION_PERIODS);

        let stored = store.get("A").await.unwrap().into_inner();
        assert_eq!(stored, updated);
    }

    /// Fractional units accumulate exactly, in memory and on disk
    #[tokio::test]
    async fn test_fractional_units_stay_exact() {
        let (dir, store) = seeded_store(vec![product("A", 30)]).await;
        let service = service(store.clone());

        service
            .apply_transit_units("A", Decimal::new(1, 1), TransitOptions::default())
            .await
            .unwrap();
        let updated = service
            .apply_transit_units("A", Decimal::new(2, 1), TransitOptions::default())
            .await
            .unwrap();
        assert_eq!(updated.in_transit, Decimal::new(3, 1));
        assert_eq!(updated.total_stock, Decimal::new(303, 1));

        let raw = std::fs::read(dir.path().join("predicciones.json")).unwrap();
        let written: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(written[0]["UNIDADES_TRANSITO"], json!(0.3));
        assert_eq!(written[0]["STOCK_TOTAL"], json!(30.3));
    }

    /// Scenario: deficit below the reorder point becomes whole boxes
    #[tokio::test]
    async fn test_immediate_fields_refreshed() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let updated = service(store)
            .apply_transit_units("A", Decimal::ZERO, TransitOptions::default())
            .await
            .unwrap();

        assert_eq!(updated.reorder_point, Decimal::from(50));
        assert_eq!(updated.deficit, Decimal::from(20));
        assert_eq!(updated.boxes_to_order, 2);
        assert_eq!(updated.units_to_order, Decimal::from(20));
        // 50 / 5, under the 22-day cap
        assert_eq!(updated.replenishment_frequency, Decimal::from(10));
    }

    /// Zero units without a purchase order leave totals and orders unchanged
    #[tokio::test]
    async fn test_zero_units_is_neutral() {
        let mut seeded = computed_product("A", 100);
        seeded.in_transit = Decimal::from(12);
        seeded.total_stock = Decimal::from(112);
        seeded
            .pending_orders
            .insert("PO-1".into(), shared::PendingOrder::new(Decimal::from(40), "MAY-2025"));
        let before = seeded.clone();
        let (_dir, store) = seeded_store(vec![seeded]).await;

        let updated = service(store)
            .apply_transit_units("A", Decimal::ZERO, TransitOptions::default())
            .await
            .unwrap();

        assert_eq!(updated.in_transit, before.in_transit);
        assert_eq!(updated.total_stock, before.total_stock);
        assert_eq!(updated.pending_orders, before.pending_orders);
        assert_eq!(updated.projections.len(), PROJECTION_PERIODS);
    }

    /// A purchase order is booked for the month of its expected arrival
    #[tokio::test]
    async fn test_purchase_order_with_arrival_date() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let options = TransitOptions {
            purchase_order_id: Some("PO-88".into()),
            expected_arrival: NaiveDate::from_ymd_opt(2025, 5, 20),
            ..Default::default()
        };
        let updated = service(store)
            .apply_transit_units("A", Decimal::from(60), options)
            .await
            .unwrap();

        let order = updated.pending_orders.get("PO-88").unwrap();
        assert_eq!(order.units, Decimal::from(60));
        assert_eq!(order.arrival_period.as_deref(), Some("MAY-2025"));
        // Received in the May period of the projection
        assert_eq!(updated.projections[2].period, "MAY-2025");
        assert!(updated.projections[2].units_received >= Decimal::from(60));
    }

    /// Without a date the order lands in the first projected month
    #[tokio::test]
    async fn test_purchase_order_defaults_to_first_period() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let options = TransitOptions {
            purchase_order_id: Some("PO-1".into()),
            ..Default::default()
        };
        let updated = service(store)
            .apply_transit_units("A", Decimal::from(10), options)
            .await
            .unwrap();
        assert_eq!(
            updated.pending_orders["PO-1"].arrival_period.as_deref(),
            Some("MAR-2025")
        );
    }

    /// A purchase order with zero units is not booked
    #[tokio::test]
    async fn test_purchase_order_needs_units() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let options = TransitOptions {
            purchase_order_id: Some("PO-0".into()),
            ..Default::default()
        };
        let updated = service(store)
            .apply_transit_units("A", Decimal::ZERO, options)
            .await
            .unwrap();
        assert!(updated.pending_orders.is_empty());
    }

    /// A preview is returned but not written
    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let options = TransitOptions {
            persist: false,
            ..Default::default()
        };
        let updated = service(store.clone())
            .apply_transit_units("A", Decimal::from(25), options)
            .await
            .unwrap();
        assert_eq!(updated.in_transit, Decimal::from(25));
        assert_eq!(store.get("A").await.unwrap().value.in_transit, Decimal::ZERO);
    }

    /// Skipping the projection leaves the stored array alone
    #[tokio::test]
    async fn test_skip_projection_recalc() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let options = TransitOptions {
            recalc_projections: false,
            update_frequency: false,
            ..Default::default()
        };
        let updated = service(store)
            .apply_transit_units("A", Decimal::from(5), options)
            .await
            .unwrap();
        assert!(updated.projections.is_empty());
        assert_eq!(updated.replenishment_frequency, Decimal::ZERO);
        assert_eq!(updated.deficit, Decimal::from(15));
    }

    /// Negative units are rejected before anything is written
    #[tokio::test]
    async fn test_invalid_units_rejected() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let before = store.read_all().await.unwrap();
        let service = service(store.clone());

        for units in [Decimal::NEGATIVE_ONE, Decimal::new(-1, 1)] {
            let err = service
                .apply_transit_units("A", units, TransitOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
        assert_eq!(store.read_all().await.unwrap(), before);
    }

    /// Unknown product codes are reported as not found
    #[tokio::test]
    async fn test_unknown_code() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let err = service(store)
            .apply_transit_units("ZZZ", Decimal::from(1), TransitOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    /// Adjusting one product leaves its neighbours untouched
    #[tokio::test]
    async fn test_other_products_untouched() {
        let (_dir, store) =
            seeded_store(vec![product("A", 30), computed_product("B", 500)]).await;
        let before_b = store.get("B").await.unwrap().into_inner();

        service(store.clone())
            .apply_transit_units("A", Decimal::from(10), TransitOptions::default())
            .await
            .unwrap();

        let all = store.read_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, "A");
        assert_eq!(all[1], before_b);
    }
}

// ============================================================================
// Transit Days
// ============================================================================

#[cfg(test)]
mod transit_days_tests {
    use super::*;

    /// Global transit days replace the policy value
    #[tokio::test]
    async fn test_global_transit_days() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let updated = service(store)
            .apply_transit_days("A", 7, TransitOptions::default())
            .await
            .unwrap();
        assert_eq!(updated.config.transit_days, 7);
        assert!(updated.projections.iter().all(|p| p.transit_days == 7));
    }

    /// Negative or excessive days are rejected
    #[tokio::test]
    async fn test_invalid_transit_days() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let service = service(store);
        for days in [-1, 366] {
            let err = service
                .apply_transit_days("A", days, TransitOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }));
        }
    }

    /// Index 0 overrides every period
    #[tokio::test]
    async fn test_projection_index_zero() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let result = service(store.clone())
            .apply_transit_days_to_projection("A", 0, 9)
            .await
            .unwrap();
        assert_eq!(result.affected_projections, 6);
        assert!(result.product.projections.iter().all(|p| p.transit_days == 9));

        let stored = store.get("A").await.unwrap().into_inner();
        assert_eq!(stored.transit_day_overrides.len(), 6);
    }

    /// A later index only touches that period and the ones after it
    #[tokio::test]
    async fn test_projection_index_tail() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let result = service(store)
            .apply_transit_days_to_projection("A", 4, 3)
            .await
            .unwrap();
        assert_eq!(result.affected_projections, 2);
        let days: Vec<u32> = result.product.projections.iter().map(|p| p.transit_days).collect();
        assert_eq!(days, vec![0, 0, 0, 0, 3, 3]);
    }

    /// Out-of-range indices fail with InvalidIndex
    #[tokio::test]
    async fn test_projection_index_out_of_range() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let service = service(store);
        for index in [6, 7, -1] {
            let err = service
                .apply_transit_days_to_projection("A", index, 3)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidIndex { .. }));
        }
    }
}

// ============================================================================
// Partial Updates
// ============================================================================

#[cfg(test)]
mod update_tests {
    use super::*;

    /// Present fields are merged and everything is recomputed
    #[tokio::test]
    async fn test_update_merges_and_recomputes() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let update = ProductUpdate::from_json(json!({
            "DESCRIPCION": "Cinta adhesiva",
            "UNIDADES_TRANSITO": 40
        }))
        .unwrap();

        let updated = service(store.clone()).update_product("A", update).await.unwrap();
        assert_eq!(updated.description, "Cinta adhesiva");
        assert_eq!(updated.total_stock, Decimal::from(70));
        assert_eq!(updated.deficit, Decimal::ZERO);
        assert_eq!(updated.projections.len(), PROJECTION_PERIODS);
        assert_eq!(store.get("A").await.unwrap().into_inner(), updated);
    }

    /// Protected keys never reach the service
    #[test]
    fn test_protected_fields_rejected() {
        for key in ["CODIGO", "STOCK_FISICO", "CONFIGURACION"] {
            let err = ProductUpdate::from_json(json!({ key: 1 })).unwrap_err();
            assert_eq!(err, shared::ValidationError::ProtectedField(key.to_string()));
        }
    }

    /// An empty update is invalid input
    #[tokio::test]
    async fn test_empty_update_rejected() {
        let (_dir, store) = seeded_store(vec![product("A", 30)]).await;
        let err = service(store)
            .update_product("A", ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Total stock always equals physical plus in-transit after an adjustment
        #[test]
        fn prop_total_is_physical_plus_transit(
            physical in 0i64..10_000,
            existing in 0i64..1_000,
            units in 0i64..10_000,
        ) {
            let updated = tokio_test::block_on(async {
                let mut seeded = product("P", physical);
                seeded.in_transit = Decimal::from(existing);
                let (_dir, store) = seeded_store(vec![seeded]).await;
                service(store)
                    .apply_transit_units("P", Decimal::new(units, 1), TransitOptions::default())
                    .await
                    .unwrap()
            });

            let added = Decimal::new(units, 1);
            prop_assert_eq!(updated.in_transit, Decimal::from(existing) + added);
            prop_assert_eq!(updated.total_stock, Decimal::from(physical + existing) + added);
            prop_assert!(updated.deficit >= Decimal::ZERO);
            prop_assert!((updated.units_to_order % Decimal::from(10)).is_zero());
        }
    }
}
