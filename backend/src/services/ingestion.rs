//! Spreadsheet ingestion job
//!
//! Runs the external prediction program over an uploaded spreadsheet, checks
//! that it produced a non-empty product array and installs that array as the
//! new snapshot. The program is killed if it outlives the configured timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::process::Command;
use uuid::Uuid;

use crate::config::IngestionConfig;
use crate::error::{AppError, AppResult};
use crate::store::{parse_collection, SnapshotStore};

/// Spreadsheet extensions the job understands
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Summary of a completed refresh
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub products: usize,
    pub duration_ms: u64,
}

/// Ingestion job runner
#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn SnapshotStore>,
    config: IngestionConfig,
}

impl IngestionService {
    pub fn new(store: Arc<dyn SnapshotStore>, config: IngestionConfig) -> Self {
        Self { store, config }
    }

    /// Stage `upload`, run the job on it and replace the snapshot with its output.
    /// The staged file is removed whether or not the job succeeds.
    pub async fn refresh(&self, upload: &[u8], extension: &str) -> AppResult<IngestionReport> {
        if upload.is_empty() {
            return Err(AppError::Validation {
                field: "excel".to_string(),
                message: "Uploaded file is empty".to_string(),
            });
        }
        if upload.len() > self.config.max_upload_bytes {
            return Err(AppError::Validation {
                field: "excel".to_string(),
                message: format!("Upload exceeds {} bytes", self.config.max_upload_bytes),
            });
        }

        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        let input = self
            .config
            .upload_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        tokio::fs::write(&input, upload).await?;

        let started = Instant::now();
        let result = self.ingest(&input).await;

        if let Err(e) = tokio::fs::remove_file(&input).await {
            tracing::warn!(path = %input.display(), error = %e, "Failed to remove staged upload");
        } else {
            tracing::debug!(path = %input.display(), "Staged upload removed");
        }

        let products = result?;
        let report = IngestionReport {
            products,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(products = report.products, duration_ms = report.duration_ms, "Snapshot refreshed");
        Ok(report)
    }

    async fn ingest(&self, input: &Path) -> AppResult<usize> {
        self.run_job(input).await?;
        let products = read_output(&self.config.output_path).await?;
        let count = products.len();
        self.store.write_all(products).await?;
        Ok(count)
    }

    /// Run the configured program with a hard timeout
    pub async fn run_job(&self, input: &Path) -> AppResult<()> {
        let args = expand_args(&self.config.args, input, &self.config.output_path);
        tracing::info!(program = %self.config.program, ?args, "Starting ingestion job");

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::UpstreamFailure(format!("Failed to start {}: {}", self.config.program, e))
            })?;

        // Dropping the child on timeout kills it
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::error!(timeout_secs = self.config.timeout_secs, "Ingestion job timed out");
                return Err(AppError::Timeout(self.config.timeout_secs));
            }
        };

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(target: "ingestion", "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            tracing::error!(status = %status, stderr = %stderr.trim(), "Ingestion job failed");
            return Err(AppError::UpstreamFailure(format!(
                "exit status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Substitute `{input}` and `{output}` placeholders
pub fn expand_args(args: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();
    args.iter()
        .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
        .collect()
}

/// Lower-cased extension of an uploaded file name, if it is a spreadsheet
pub fn spreadsheet_extension(file_name: &str) -> Option<String> {
    let ext = PathBuf::from(file_name)
        .extension()?
        .to_string_lossy()
        .to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

async fn read_output(path: &Path) -> AppResult<Vec<shared::ProductSnapshot>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Ingestion output {}", path.display())))
        }
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::ValidationError(format!(
            "Ingestion output {} is empty",
            path.display()
        )));
    }
    parse_collection(&bytes)
}
