//! Durable object store abstraction for persisted records.
//!
//! Records are one JSON document per key under a caller-supplied prefix. The
//! store only guarantees per-key atomic puts; keys are unique per record
//! (see [`crate::record::codec::make_record_key`]) so no cross-key
//! coordination is needed even under concurrent writers.

pub mod fs;
pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;

pub use fs::FsObjectStore;
pub use memory::MemoryStore;

/// Minimal object-store contract used as the persistence substrate for all
/// record types.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Reads the object at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Lists all keys starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// A parsed S3-style storage reference: `s3://bucket/key-or-prefix`.
///
/// Parsing failures are fatal to the operation that received the reference
/// and must be reported before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUri {
    pub bucket: String,
    pub key: String,
}

impl StoreUri {
    /// Parses an `s3://bucket/key` reference.
    pub fn parse(uri: &str) -> Result<Self, StoreError> {
        let rest = uri.strip_prefix("s3://").ok_or_else(|| {
            StoreError::InvalidReference {
                uri: uri.to_string(),
                reason: "expected s3:// scheme".to_string(),
            }
        })?;

        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| StoreError::InvalidReference {
                uri: uri.to_string(),
                reason: "expected s3://bucket-name/path".to_string(),
            })?;

        if bucket.is_empty() || key.is_empty() {
            return Err(StoreError::InvalidReference {
                uri: uri.to_string(),
                reason: "bucket and path must be non-empty".to_string(),
            });
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl std::fmt::Display for StoreUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_uri_parse() {
        let uri = StoreUri::parse("s3://bronze/evaluation_data/batch/demo/").expect("parse");
        assert_eq!(uri.bucket, "bronze");
        assert_eq!(uri.key, "evaluation_data/batch/demo/");
        assert_eq!(uri.to_string(), "s3://bronze/evaluation_data/batch/demo/");
    }

    #[test]
    fn test_store_uri_rejects_wrong_scheme() {
        let err = StoreUri::parse("http://bronze/data").unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference { .. }));
    }

    #[test]
    fn test_store_uri_rejects_missing_path() {
        assert!(StoreUri::parse("s3://bronze").is_err());
        assert!(StoreUri::parse("s3://bronze/").is_err());
        assert!(StoreUri::parse("s3:///path").is_err());
    }
}
