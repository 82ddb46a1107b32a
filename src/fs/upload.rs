//! Upload orchestration.
//!
//! An upload runs through `Requesting-Authorization` (fresh key + signed
//! destination URL) into `Transferring` (the only phase that reports
//! progress) and settles as completed, cancelled, or failed. Cancelled and
//! failed are distinguishable to the caller: cancellation surfaces as
//! [`StorageError::Cancelled`], never as a generic transport failure.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{Result, StorageError};
use crate::fs::operations::Drive;
use crate::key;
use crate::mime::content_type_for;
use crate::progress::{ProgressCallback, TransferProgress};
use crate::store::SIGNED_URL_TTL_SECS;
use crate::transfer::TransportProgress;

/// One pending upload: a local source and the remote file name.
///
/// Transient: exists only for the duration of one upload and is owned by
/// the call site that started it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Local file to upload.
    pub source: PathBuf,
    /// File name to store under (the key adds a UUID prefix).
    pub file_name: String,
}

impl UploadRequest {
    /// Build a request from a local path, deriving the remote name from the
    /// path's leaf.
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let source = path.into();
        let metadata = tokio::fs::metadata(&source).await?;
        if !metadata.is_file() {
            return Err(StorageError::Validation(format!(
                "`{}` is not a file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                StorageError::Validation(format!(
                    "cannot derive a file name from `{}`",
                    source.display()
                ))
            })?;
        Ok(Self { source, file_name })
    }
}

impl Drive {
    /// Upload a local file under a fresh unique key.
    ///
    /// # Arguments
    /// * `source` - Local file to upload
    /// * `file_name` - Original file name; the stored key is `{uuid}-{name}`
    /// * `on_progress` - Invoked with monotonically non-decreasing progress
    ///   from 0 to 100 percent as bytes are acknowledged
    /// * `cancel` - Triggering the token halts the transfer promptly with
    ///   [`StorageError::Cancelled`]; no further progress (in particular no
    ///   completion) is reported after cancellation, and the destination
    ///   object must be treated as absent or garbage
    ///
    /// # Returns
    /// The stored object key.
    pub async fn upload_file(
        &self,
        source: &Path,
        file_name: &str,
        on_progress: ProgressCallback,
        cancel: CancellationToken,
    ) -> Result<String> {
        // 1. Request authorization: fresh key, time-limited write URL.
        let object_key = key::unique_file_key(file_name)?;
        let content_type = content_type_for(file_name);
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let url = self
            .store
            .presign_put(&object_key, content_type, SIGNED_URL_TTL_SECS)
            .await
            .map_err(|e| {
                warn!(key = %object_key, error = %e, "upload authorization failed");
                e
            })?;

        // 2. Transfer, forwarding progress. The wrapper keeps reports
        //    monotonic and drops anything arriving after cancellation.
        let forward = progress_forwarder(file_name.to_string(), on_progress, cancel.clone());
        self.transport
            .put_file(&url, source, content_type, forward, cancel)
            .await
            .map_err(|e| {
                if !e.is_cancelled() {
                    warn!(key = %object_key, error = %e, "upload transfer failed");
                }
                e
            })?;

        Ok(object_key)
    }
}

fn progress_forwarder(
    file_name: String,
    mut on_progress: ProgressCallback,
    cancel: CancellationToken,
) -> TransportProgress {
    let mut reported = None;
    Box::new(move |done, total| {
        if cancel.is_cancelled() {
            return;
        }
        if reported.is_some_and(|previous| done < previous) {
            return;
        }
        reported = Some(done);
        on_progress(&TransferProgress::new(done, total, &file_name));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::sync::{Arc, Mutex};

    use crate::store::memory::MemoryStore;
    use crate::transfer::ScriptedTransport;

    fn drive_with_script(store: Arc<MemoryStore>, total: u64, acks: Vec<u64>) -> Drive {
        let transport = ScriptedTransport {
            total,
            acks,
            store: Some(store.clone()),
        };
        Drive::new(store, Arc::new(transport))
    }

    fn percent_sink() -> (Arc<Mutex<Vec<f64>>>, ProgressCallback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback =
            Box::new(move |progress| sink.lock().unwrap().push(progress.percent()));
        (seen, callback)
    }

    #[tokio::test]
    async fn test_upload_progress_percentages() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_with_script(store.clone(), 1000, vec![0, 250, 500, 1000]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"pretend-png").unwrap();

        let (seen, callback) = percent_sink();
        let object_key = drive
            .upload_file(
                file.path(),
                "cat.png",
                callback,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let percents = seen.lock().unwrap().clone();
        assert_eq!(percents, vec![0.0, 25.0, 50.0, 100.0]);
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*percents.last().unwrap(), 100.0);

        // Key follows the `{uuid}-{name}` convention and lands in the store.
        assert_eq!(key::display_name(&object_key, ""), "cat.png");
        assert!(store.contains(&object_key));
        assert_eq!(
            store.data(&object_key).unwrap(),
            bytes::Bytes::from("pretend-png")
        );
    }

    #[tokio::test]
    async fn test_upload_cancelled_mid_transfer() {
        let store = Arc::new(MemoryStore::new());
        let drive = drive_with_script(store.clone(), 1000, vec![0, 250, 500, 1000]);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ProgressCallback = Box::new(move |progress| {
            sink.lock().unwrap().push(progress.percent());
            if progress.percent() >= 50.0 {
                trigger.cancel();
            }
        });

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"pretend-png").unwrap();

        let result = drive
            .upload_file(file.path(), "cat.png", callback, cancel)
            .await;

        assert!(matches!(result, Err(StorageError::Cancelled)));
        let percents = seen.lock().unwrap().clone();
        // Nothing implying completion after cancellation.
        assert_eq!(percents, vec![0.0, 25.0, 50.0]);
        assert!(percents.iter().all(|&p| p < 100.0));
        // The aborted destination never became a stored object.
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_upload_with_pre_cancelled_token() {
        let drive = drive_with_script(Arc::new(MemoryStore::new()), 1000, vec![0, 1000]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (seen, callback) = percent_sink();
        let result = drive
            .upload_file(Path::new("/dev/null"), "cat.png", callback, cancel)
            .await;

        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_name() {
        let drive = drive_with_script(Arc::new(MemoryStore::new()), 0, vec![]);
        let (_, callback) = percent_sink();
        let result = drive
            .upload_file(Path::new("/dev/null"), "  ", callback, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upload_request_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hi").unwrap();

        let request = UploadRequest::from_path(&path).await.unwrap();
        assert_eq!(request.file_name, "notes.txt");
        assert_eq!(request.source, path);

        assert!(UploadRequest::from_path(dir.path()).await.is_err());
        assert!(UploadRequest::from_path(dir.path().join("missing")).await.is_err());
    }
}
