//! Object-store abstraction and backends.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub mod r2;

#[cfg(test)]
pub(crate) mod memory;

pub use r2::R2Store;

/// Default expiry for signed URLs, in seconds.
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMeta {
    /// Full object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last-modified timestamp, if the store reported one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a prefix listing.
///
/// With a delimiter, `common_prefixes` holds one entry per immediate
/// sub-prefix (one level of virtual directories) and `objects` holds the
/// keys directly under the prefix. Without a delimiter, `objects` holds the
/// entire subtree and `common_prefixes` is empty. Both preserve the store's
/// response order.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Objects under the prefix.
    pub objects: Vec<ObjectMeta>,
    /// Sub-prefixes grouped by the delimiter.
    pub common_prefixes: Vec<String>,
}

/// Flat key-value object-store primitives.
///
/// Implementations paginate listings to completion and surface transport
/// failures through [`crate::StorageError`]; they perform no retries of
/// their own.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object.
    async fn put_object(&self, key: &str, content_type: &str, body: Bytes) -> Result<()>;

    /// List objects under a prefix, optionally grouping by a delimiter.
    async fn list_objects(&self, prefix: &str, delimiter: Option<&str>) -> Result<ListResult>;

    /// Delete a single object. Deleting an absent key succeeds.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// Fetch an object's full body.
    async fn get_object(&self, key: &str) -> Result<Bytes>;

    /// Server-side copy from `source_key` to `dest_key` within the bucket.
    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()>;

    /// HEAD-like metadata lookup; `None` if the key is absent.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// Time-limited URL authorizing a PUT of `key`.
    async fn presign_put(&self, key: &str, content_type: &str, expires_secs: u64)
        -> Result<String>;

    /// Time-limited URL authorizing a GET of `key`.
    async fn presign_get(&self, key: &str, expires_secs: u64) -> Result<String>;
}
