//! Snapshot store backed by a single JSON file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared::ProductSnapshot;
use tokio::sync::Mutex;

use super::{SnapshotStore, Version, Versioned};
use crate::error::{AppError, AppResult};

/// The whole collection as one JSON array on disk.
///
/// Writers hold `write_lock` across their read-check-write so version checks
/// and the rename that publishes them happen as one step.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> AppResult<Vec<ProductSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!(
                    "Snapshot file {}",
                    self.path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };
        parse_collection(&bytes)
    }

    async fn store(&self, products: &[ProductSnapshot]) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(products)
            .map_err(|e| AppError::Internal(format!("Failed to serialize snapshot: {}", e)))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Write next to the target and rename over it
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(e) = tokio::fs::write(&tmp, &json).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), count = products.len(), "Snapshot written");
        Ok(())
    }
}

/// Parse a snapshot collection, rejecting anything but a JSON array of products
pub fn parse_collection(bytes: &[u8]) -> AppResult<Vec<ProductSnapshot>> {
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::InvalidSnapshot(format!("Snapshot is not a product array: {}", e)))
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn read_all(&self) -> AppResult<Vec<ProductSnapshot>> {
        self.load().await
    }

    async fn write_all(&self, products: Vec<ProductSnapshot>) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store(&products).await
    }

    async fn get(&self, code: &str) -> AppResult<Versioned<ProductSnapshot>> {
        let product = self
            .load()
            .await?
            .into_iter()
            .find(|p| p.code == code)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", code)))?;
        let version = Version::of(&product)?;
        Ok(Versioned {
            value: product,
            version,
        })
    }

    async fn put(
        &self,
        code: &str,
        record: ProductSnapshot,
        expected: &Version,
    ) -> AppResult<Version> {
        let _guard = self.write_lock.lock().await;

        let mut products = self.load().await?;
        let slot = products
            .iter_mut()
            .find(|p| p.code == code)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", code)))?;

        if &Version::of(slot)? != expected {
            return Err(AppError::Conflict {
                resource: code.to_string(),
                message: format!("Product {} was modified concurrently; reload and retry", code),
            });
        }

        let version = Version::of(&record)?;
        *slot = record;
        self.store(&products).await?;
        Ok(version)
    }
}
