//! Stock alert evaluation and de-duplication
//!
//! An alert fires when the first projected month shows low coverage, the
//! stock alarm flag or a deficit. Automatic alerts go out at most once per
//! product per day; manual requests always send.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use askama::Template;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{wire::NOT_APPLICABLE, ProductSnapshot};

use crate::error::{AppError, AppResult};
use crate::external::{Notification, Notifier};
use crate::store::SnapshotStore;

/// Last-sent time per product code, with TTL eviction
#[derive(Debug)]
pub struct AlertLedger {
    ttl: Duration,
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl AlertLedger {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether an alert for `code` was recorded on calendar day `date`
    pub fn sent_on(&self, code: &str, date: NaiveDate) -> bool {
        self.lock()
            .get(code)
            .map(|at| at.date_naive() == date)
            .unwrap_or(false)
    }

    pub fn record(&self, code: &str, at: DateTime<Utc>) {
        self.lock().insert(code.to_string(), at);
    }

    /// Claim the automatic alert for `code` on the calendar day of `now`.
    /// Returns false when the day is already claimed.
    pub fn try_reserve(&self, code: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.lock();
        let today = now.date_naive();
        if entries.get(code).is_some_and(|at| at.date_naive() == today) {
            return false;
        }
        entries.insert(code.to_string(), now);
        true
    }

    /// Undo a reservation made at `at`; a newer entry is left alone
    pub fn release(&self, code: &str, at: DateTime<Utc>) {
        let mut entries = self.lock();
        if entries.get(code) == Some(&at) {
            entries.remove(code);
        }
    }

    /// Drop entries older than `ttl`; returns how many were removed
    pub fn evict_older_than(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, at| now - *at < ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // A panic while holding the lock cannot leave the map inconsistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

/// What the evaluator did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertOutcome {
    NotRequired,
    AlreadySent,
    Sent { message_id: String },
    Failed { error: String },
}

/// Figures an alert decision is based on
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSignal {
    pub coverage_days: Decimal,
    pub stock_alert: bool,
    pub deficit: Decimal,
}

impl AlertSignal {
    /// First projected month, or the immediate fields when nothing is projected
    pub fn from_product(product: &ProductSnapshot) -> Self {
        match product.projections.first() {
            Some(first) => Self {
                coverage_days: first.coverage_days,
                stock_alert: first.stock_alert,
                deficit: first.deficit,
            },
            None => Self {
                coverage_days: product.coverage_days,
                stock_alert: false,
                deficit: product.deficit,
            },
        }
    }

    pub fn requires_alert(&self, coverage_threshold_days: Decimal) -> bool {
        self.coverage_days <= coverage_threshold_days
            || self.stock_alert
            || self.deficit > Decimal::ZERO
    }
}

/// Alert evaluator
#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    ledger: Arc<AlertLedger>,
    coverage_threshold_days: Decimal,
}

impl AlertService {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
        ledger: Arc<AlertLedger>,
        coverage_threshold_days: Decimal,
    ) -> Self {
        Self {
            store,
            notifier,
            ledger,
            coverage_threshold_days,
        }
    }

    /// Decide whether `code` needs an alert and send it to `recipient`.
    ///
    /// Automatic evaluations claim the day in the ledger before sending, so
    /// two concurrent evaluations of the same product send once. The claim is
    /// released again when delivery fails.
    pub async fn evaluate(
        &self,
        code: &str,
        recipient: &str,
        is_manual: bool,
        now: DateTime<Utc>,
    ) -> AppResult<AlertOutcome> {
        let evicted = self.ledger.evict_older_than(now, self.ledger.ttl());
        if evicted > 0 {
            tracing::debug!(evicted, "Expired alert ledger entries");
        }

        let product = self.store.get(code).await?.into_inner();
        if !AlertSignal::from_product(&product).requires_alert(self.coverage_threshold_days) {
            tracing::info!(code = %code, "No alert required");
            return Ok(AlertOutcome::NotRequired);
        }

        let notification = compose_alert(&product)?;

        if !is_manual && !self.ledger.try_reserve(code, now) {
            tracing::info!(code = %code, "Alert already sent today");
            return Ok(AlertOutcome::AlreadySent);
        }

        match self.notifier.send(recipient, &notification).await {
            Ok(delivery) => {
                if is_manual {
                    self.ledger.record(code, now);
                }
                tracing::info!(
                    code = %code,
                    channel = self.notifier.channel(),
                    is_manual,
                    message_id = %delivery.message_id,
                    "Stock alert sent"
                );
                Ok(AlertOutcome::Sent {
                    message_id: delivery.message_id,
                })
            }
            Err(e) => {
                if !is_manual {
                    self.ledger.release(code, now);
                }
                tracing::warn!(code = %code, channel = self.notifier.channel(), error = %e, "Stock alert failed");
                Ok(AlertOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }
}

/// One labelled line of the alert body
struct AlertRow {
    label: &'static str,
    value: String,
}

/// HTML body of the stock alert
#[derive(Template)]
#[template(path = "email/stock_alert.html")]
struct StockAlertHtml<'a> {
    rows: &'a [AlertRow],
}

/// Plain text body of the stock alert
#[derive(Template)]
#[template(path = "email/stock_alert.txt")]
struct StockAlertText<'a> {
    rows: &'a [AlertRow],
}

/// Subject and bodies for a product's stock alert
pub fn compose_alert(product: &ProductSnapshot) -> AppResult<Notification> {
    let first = product.projections.first();
    let reorder_date = product
        .reorder_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NOT_APPLICABLE.to_string());
    let coverage = first.map(|p| p.coverage_days).unwrap_or(product.coverage_days);
    let deficit = first.map(|p| p.deficit).unwrap_or(product.deficit);
    let boxes = first.map(|p| p.boxes_to_order).unwrap_or(product.boxes_to_order);
    let units = first.map(|p| p.units_to_order).unwrap_or(product.units_to_order);
    let period = first.map(|p| p.period.as_str()).unwrap_or(NOT_APPLICABLE);

    let row = |label, value: String| AlertRow { label, value };
    let rows = [
        row("Producto", product.description.clone()),
        row("Código", product.code.clone()),
        row("Periodo", period.to_string()),
        row("Stock total", product.total_stock.normalize().to_string()),
        row("Punto de reorden", product.reorder_point.normalize().to_string()),
        row("Fecha de reposición ideal", reorder_date),
        row("Días de cobertura", coverage.normalize().to_string()),
        row("Déficit", format!("{} unidades", deficit.normalize())),
        row("Pedir", format!("{} cajas / {} unidades", boxes, units.normalize())),
    ];

    let render_error = |e: askama::Error| AppError::Internal(format!("Alert template error: {}", e));
    let html_body = StockAlertHtml { rows: &rows }.render().map_err(render_error)?;
    let text_body = StockAlertText { rows: &rows }.render().map_err(render_error)?;

    Ok(Notification {
        subject: format!("Alerta de stock: {} ({})", product.description, product.code),
        html_body,
        text_body,
    })
}
