//! Business logic services for the Inventory Forecast Platform

pub mod alert;
pub mod ingestion;
pub mod predictions;
pub mod transit;

pub use alert::{AlertLedger, AlertOutcome, AlertService};
pub use ingestion::{IngestionReport, IngestionService};
pub use predictions::PredictionService;
pub use transit::{ProjectionAdjustment, TransitOptions, TransitService};
