//! Product snapshot persistence
//!
//! The collection is keyed by product code. Readers get owned copies tagged
//! with a [`Version`]; writers publish a whole record and must present the
//! version they read, so two overlapping read-modify-write cycles cannot
//! silently overwrite each other.

mod json_file;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::ProductSnapshot;

use crate::error::{AppError, AppResult};

pub use json_file::{parse_collection, JsonFileStore};

/// Opaque content hash of one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Hash of the record's canonical JSON
    pub fn of(record: &ProductSnapshot) -> AppResult<Self> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", record.code, e)))?;
        let digest = Sha256::digest(&bytes);
        Ok(Self(STANDARD.encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Version {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// An owned value together with the version it was read at
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

impl<T> Versioned<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Keyed access to the product snapshot collection
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Every product, in stored order
    async fn read_all(&self) -> AppResult<Vec<ProductSnapshot>>;

    /// Replace the whole collection
    async fn write_all(&self, products: Vec<ProductSnapshot>) -> AppResult<()>;

    /// Owned copy of one product and its current version
    async fn get(&self, code: &str) -> AppResult<Versioned<ProductSnapshot>>;

    /// Publish `record` under `code` if the stored version still equals
    /// `expected`; returns the new version
    async fn put(
        &self,
        code: &str,
        record: ProductSnapshot,
        expected: &Version,
    ) -> AppResult<Version>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tracks_content() {
        let mut product = ProductSnapshot::new("A1", "Lápiz");
        let first = Version::of(&product).unwrap();
        assert_eq!(first, Version::of(&product.clone()).unwrap());

        product.in_transit = rust_decimal::Decimal::from(5);
        assert_ne!(first, Version::of(&product).unwrap());
        // base64 of a 32-byte digest
        assert_eq!(first.as_str().len(), 44);
    }
}
