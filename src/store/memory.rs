//! In-memory store double for tests.
//!
//! Implements the same prefix/delimiter listing semantics as the real
//! backend, with a deterministic logical clock for last-modified stamps.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{ListResult, ObjectMeta, ObjectStore};
use crate::error::{Result, StorageError};

const CLOCK_BASE_SECS: i64 = 1_700_000_000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    clock: AtomicI64,
    fail_copy: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Each mutation gets a strictly later timestamp.
    fn tick(&self) -> DateTime<Utc> {
        let seq = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(CLOCK_BASE_SECS + seq, 0).expect("valid timestamp")
    }

    /// Make every subsequent copy fail with a transport error.
    pub(crate) fn fail_copies(&self) {
        self.fail_copy.store(true, Ordering::SeqCst);
    }

    pub(crate) fn insert(&self, key: &str, data: impl Into<Bytes>, content_type: &str) {
        let stamp = self.tick();
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                content_type: content_type.to_string(),
                last_modified: stamp,
            },
        );
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub(crate) fn data(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).map(|o| o.data.clone())
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, content_type: &str, body: Bytes) -> Result<()> {
        self.insert(key, body, content_type);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str, delimiter: Option<&str>) -> Result<ListResult> {
        let objects = self.objects.lock().unwrap();
        let mut result = ListResult::default();
        let mut seen_prefixes = std::collections::HashSet::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match delimiter.and_then(|d| rest.find(d).map(|idx| (d, idx))) {
                Some((d, idx)) => {
                    let common = &key[..prefix.len() + idx + d.len()];
                    if seen_prefixes.insert(common.to_string()) {
                        result.common_prefixes.push(common.to_string());
                    }
                }
                None => result.objects.push(ObjectMeta {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    last_modified: Some(object.last_modified),
                }),
            }
        }
        Ok(result)
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(StorageError::Transport("injected copy failure".into()));
        }
        let source = self
            .objects
            .lock()
            .unwrap()
            .get(source_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(source_key.to_string()))?;
        self.insert(dest_key, source.data, &source.content_type);
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectMeta>> {
        Ok(self.objects.lock().unwrap().get(key).map(|o| ObjectMeta {
            key: key.to_string(),
            size: o.data.len() as u64,
            last_modified: Some(o.last_modified),
        }))
    }

    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _expires_secs: u64,
    ) -> Result<String> {
        Ok(format!("memory://put/{key}"))
    }

    async fn presign_get(&self, key: &str, _expires_secs: u64) -> Result<String> {
        Ok(format!("memory://get/{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delimiter_grouping() {
        let store = MemoryStore::new();
        store.insert("a.txt", "1", "text/plain");
        store.insert("Photos/", "", "application/octet-stream");
        store.insert("Photos/cat.png", "22", "image/png");
        store.insert("Photos/Work/doc.pdf", "333", "application/pdf");

        let root = store.list_objects("", Some("/")).await.unwrap();
        assert_eq!(root.objects.len(), 1);
        assert_eq!(root.objects[0].key, "a.txt");
        assert_eq!(root.common_prefixes, vec!["Photos/"]);

        let photos = store.list_objects("Photos/", Some("/")).await.unwrap();
        // The marker itself lists as an object at its own level.
        let keys: Vec<_> = photos.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["Photos/", "Photos/cat.png"]);
        assert_eq!(photos.common_prefixes, vec!["Photos/Work/"]);
    }

    #[tokio::test]
    async fn test_undelimited_listing_is_recursive() {
        let store = MemoryStore::new();
        store.insert("Photos/cat.png", "22", "image/png");
        store.insert("Photos/Work/doc.pdf", "333", "application/pdf");

        let all = store.list_objects("Photos/", None).await.unwrap();
        assert_eq!(all.objects.len(), 2);
        assert!(all.common_prefixes.is_empty());
    }

    #[tokio::test]
    async fn test_clock_is_monotonic() {
        let store = MemoryStore::new();
        store.insert("a", "1", "text/plain");
        store.insert("b", "2", "text/plain");
        let a = store.head_object("a").await.unwrap().unwrap();
        let b = store.head_object("b").await.unwrap().unwrap();
        assert!(b.last_modified > a.last_modified);
    }
}
