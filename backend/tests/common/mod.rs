//! Fixtures shared by the backend integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use forecast_server::external::{Delivery, Notification, Notifier, NotifyError};
use forecast_server::store::{JsonFileStore, SnapshotStore};
use rust_decimal::Decimal;
use shared::{recompute_immediate, recompute_projection, ProductSnapshot, ProjectionContext};
use tempfile::TempDir;

pub fn anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

pub fn context() -> ProjectionContext {
    ProjectionContext::new(anchor(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
}

/// 10 units per box, 5 units per day, reorder point of 10 days (50 units)
pub fn product(code: &str, physical: i64) -> ProductSnapshot {
    let mut product = ProductSnapshot::new(code, format!("Producto {}", code));
    product.physical_stock = Decimal::from(physical);
    product.total_stock = Decimal::from(physical);
    product.units_per_box = Decimal::from(10);
    product.daily_consumption = Decimal::from(5);
    product.config.reorder_point_days = 10;
    product
}

/// Same as [`product`] with every derived field computed
pub fn computed_product(code: &str, physical: i64) -> ProductSnapshot {
    let mut product = product(code, physical);
    recompute_immediate(&mut product, &context());
    recompute_projection(&mut product, &context());
    product
}

/// A store in a fresh temp dir holding `products`
pub async fn seeded_store(products: Vec<ProductSnapshot>) -> (TempDir, Arc<JsonFileStore>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("predicciones.json")));
    store.write_all(products).await.unwrap();
    (dir, store)
}

/// Notifier that records every message and succeeds unless told otherwise
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    /// Time each delivery takes
    pub delay: Option<Duration>,
    sends: AtomicUsize,
    pub sent: Mutex<Vec<(String, Notification)>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<Delivery, NotifyError> {
        let n = self.sends.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(NotifyError::Transport("connection refused".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), notification.clone()));
        Ok(Delivery {
            message_id: format!("msg-{}", n),
        })
    }
}
