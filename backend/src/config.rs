//! Configuration management for the Inventory Forecast Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FORECAST_ prefix

use std::path::PathBuf;

use chrono::NaiveDate;
use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Product snapshot file
    pub snapshot: SnapshotConfig,

    /// Projection engine settings
    pub projection: ProjectionConfig,

    /// Spreadsheet ingestion job
    pub ingestion: IngestionConfig,

    /// Stock alert evaluation
    pub alerts: AlertConfig,

    /// Outbound notification channel
    pub notifications: NotificationConfig,

    /// Log output
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    /// JSON file holding the whole product collection
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectionConfig {
    /// First month of every projection
    pub anchor_date: NaiveDate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestionConfig {
    /// Executable that turns a spreadsheet into the snapshot JSON
    pub program: String,

    /// Arguments; `{input}` is replaced by the uploaded file path and
    /// `{output}` by `output_path`
    #[serde(default)]
    pub args: Vec<String>,

    /// Hard limit before the job is killed
    pub timeout_secs: u64,

    /// Where uploads are staged while the job runs
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size
    pub max_upload_bytes: usize,

    /// File the job writes its JSON array to
    pub output_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    /// How long a sent alert suppresses automatic re-sends
    pub dedup_ttl_hours: i64,

    /// Coverage at or below which an alert fires
    pub coverage_threshold_days: Decimal,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Whatsapp,
    Disabled,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub channel: NotificationChannel,
    pub smtp: Option<SmtpConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender address, e.g. `Inventario <alertas@example.com>`
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WhatsAppConfig {
    /// CallMeBot-style endpoint
    pub api_url: String,
    pub phone: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FORECAST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("snapshot.path", "data/predicciones.json")?
            .set_default("projection.anchor_date", "2025-03-01")?
            .set_default("ingestion.program", "python3")?
            .set_default("ingestion.args", vec!["scripts/predict.py", "{input}", "{output}"])?
            .set_default("ingestion.timeout_secs", 300)?
            .set_default("ingestion.upload_dir", "uploads")?
            .set_default("ingestion.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("ingestion.output_path", "data/predicciones.json")?
            .set_default("alerts.dedup_ttl_hours", 24)?
            .set_default("alerts.coverage_threshold_days", 10.0)?
            .set_default("notifications.channel", "disabled")?
            .set_default("log.format", "pretty")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FORECAST_ prefix)
            .add_source(
                Environment::with_prefix("FORECAST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Settings for tests and local tooling: everything local, nothing sent
    pub fn for_snapshot(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            snapshot: SnapshotConfig { path: path.clone() },
            projection: ProjectionConfig {
                anchor_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default(),
            },
            ingestion: IngestionConfig {
                program: "sh".to_string(),
                args: Vec::new(),
                timeout_secs: 300,
                upload_dir: dir.join("uploads"),
                max_upload_bytes: 10 * 1024 * 1024,
                output_path: path,
            },
            alerts: AlertConfig {
                dedup_ttl_hours: 24,
                coverage_threshold_days: Decimal::TEN,
            },
            notifications: NotificationConfig {
                channel: NotificationChannel::Disabled,
                smtp: None,
                whatsapp: None,
            },
            log: LogConfig {
                format: LogFormat::Pretty,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
