//! Filesystem operations over the flat key space.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use tracing::warn;

use crate::config::R2Config;
use crate::error::{Result, StorageError};
use crate::fs::entry::{FileEntry, FolderEntry, Listing};
use crate::key;
use crate::store::{ObjectStore, R2Store, SIGNED_URL_TTL_SECS};
use crate::transfer::{HttpTransport, Transport};

/// Virtual-folder filesystem adapter over a flat object store.
///
/// Folder semantics (create, move, rename, recursive delete, aggregation)
/// are simulated with key-prefix conventions and recursive list/copy/delete
/// calls; the store itself has no directory concept. Every operation is an
/// independent call — there are no cross-operation transactions, and callers
/// re-list after a mutation to observe a consistent view.
///
/// Recursive delete and rename are not atomic: a failure mid-recursion
/// leaves the tree partially mutated and surfaces the first error without
/// rolling back completed sub-steps.
pub struct Drive {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Drive {
    /// Build a drive from explicit collaborators.
    ///
    /// Tests substitute in-memory doubles here; production code usually
    /// goes through [`Drive::connect`].
    pub fn new(store: Arc<dyn ObjectStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Build a drive talking to R2 over HTTP.
    pub fn connect(config: &R2Config) -> Self {
        Self::new(
            Arc::new(R2Store::new(config)),
            Arc::new(HttpTransport::new()),
        )
    }

    /// List the immediate contents of a path.
    ///
    /// # Arguments
    /// * `path` - Prefix to list: `""` for the root, otherwise ending in `/`
    ///
    /// # Returns
    /// Files directly under the path and one level of sub-folders. Each
    /// folder entry carries aggregates computed over its whole subtree:
    /// descendant file count, total size, and the most recently modified
    /// descendant's timestamp.
    pub async fn list_files(&self, path: &str) -> Result<Listing> {
        key::validate_prefix(path)?;

        let page = self
            .store
            .list_objects(path, Some("/"))
            .await
            .map_err(|e| self.log_error("list", path, e))?;

        let files = page
            .objects
            .into_iter()
            .filter(|object| !key::is_folder_key(&object.key))
            .map(|object| FileEntry {
                key: object.key,
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect();

        let mut folders = Vec::with_capacity(page.common_prefixes.len());
        for prefix in page.common_prefixes {
            folders.push(self.aggregate_folder(path, prefix).await?);
        }

        Ok(Listing { files, folders })
    }

    /// Compute a folder entry by listing its entire subtree in one
    /// undelimited call.
    async fn aggregate_folder(&self, parent: &str, prefix: String) -> Result<FolderEntry> {
        let subtree = self
            .store
            .list_objects(&prefix, None)
            .await
            .map_err(|e| self.log_error("aggregate", &prefix, e))?;

        let mut file_count = 0;
        let mut total_size = 0;
        let mut last_modified = None;
        for object in &subtree.objects {
            if key::is_folder_key(&object.key) {
                continue;
            }
            file_count += 1;
            total_size += object.size;
            // Most recently modified descendant wins.
            if object.last_modified > last_modified {
                last_modified = object.last_modified;
            }
        }

        Ok(FolderEntry {
            name: key::folder_display_name(&prefix, parent),
            prefix,
            file_count,
            total_size,
            last_modified,
        })
    }

    /// Create a virtual folder by writing a zero-byte marker object.
    ///
    /// Re-creating an existing folder overwrites the empty marker
    /// harmlessly; there is no check for a pre-existing folder of the same
    /// name.
    ///
    /// # Returns
    /// The folder key, `{path}{name}/`.
    pub async fn create_folder(&self, name: &str, path: &str) -> Result<String> {
        let folder_key = key::folder_key(name, path)?;
        self.store
            .put_object(&folder_key, "application/octet-stream", Bytes::new())
            .await
            .map_err(|e| self.log_error("create folder", &folder_key, e))?;
        Ok(folder_key)
    }

    /// Delete a file, or a folder and everything under it.
    ///
    /// Folder keys recurse depth-first: files before sibling sub-folders,
    /// the folder marker itself last, so an interrupted run never leaves
    /// orphaned children under a removed container.
    pub async fn delete(&self, key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(StorageError::Validation("key cannot be empty".into()));
        }
        self.delete_tree(key.to_string()).await
    }

    fn delete_tree(&self, target: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if key::is_folder_key(&target) {
                let children = self
                    .store
                    .list_objects(&target, Some("/"))
                    .await
                    .map_err(|e| self.log_error("delete", &target, e))?;

                for object in children.objects {
                    // The marker lists at its own level; it goes last.
                    if object.key == target {
                        continue;
                    }
                    self.store
                        .delete_object(&object.key)
                        .await
                        .map_err(|e| self.log_error("delete", &object.key, e))?;
                }
                for sub_prefix in children.common_prefixes {
                    self.delete_tree(sub_prefix).await?;
                }
            }
            self.store
                .delete_object(&target)
                .await
                .map_err(|e| self.log_error("delete", &target, e))
        })
    }

    /// Move a file into a target folder.
    ///
    /// The destination key is the source's leaf name with the UUID
    /// convention stripped, re-prefixed with the target folder. The move is
    /// copy-then-delete: the copy is verified (destination present, sizes
    /// equal) before the source is deleted, so a failed copy never loses
    /// the source.
    ///
    /// # Arguments
    /// * `source_key` - Key of the file to move (not a folder)
    /// * `target_prefix` - Destination folder: `""` for the root, otherwise
    ///   ending in `/`
    ///
    /// # Returns
    /// The destination key.
    pub async fn move_file(&self, source_key: &str, target_prefix: &str) -> Result<String> {
        if source_key.trim().is_empty() {
            return Err(StorageError::Validation("key cannot be empty".into()));
        }
        if key::is_folder_key(source_key) {
            return Err(StorageError::Validation(
                "cannot move a folder; rename it instead".into(),
            ));
        }
        key::validate_prefix(target_prefix)?;

        let leaf = key::strip_uuid_prefix(key::leaf_name(source_key));
        let dest_key = format!("{target_prefix}{leaf}");

        let source_meta = self
            .store
            .head_object(source_key)
            .await
            .map_err(|e| self.log_error("move", source_key, e))?
            .ok_or_else(|| StorageError::NotFound(source_key.to_string()))?;

        self.copy_verified(source_key, &dest_key, source_meta.size)
            .await?;
        self.store
            .delete_object(source_key)
            .await
            .map_err(|e| self.log_error("move", source_key, e))?;
        Ok(dest_key)
    }

    /// Rename a file or folder.
    ///
    /// Folder prefixes recursively rename every descendant by replacing the
    /// leading prefix in each key, the container marker last, mirroring
    /// delete's ordering. Like move, each step is copy-then-delete with a
    /// verified copy.
    pub async fn rename(&self, old_key: &str, new_key: &str) -> Result<()> {
        if old_key.trim().is_empty() || new_key.trim().is_empty() {
            return Err(StorageError::Validation("key cannot be empty".into()));
        }
        if key::is_folder_key(old_key) != key::is_folder_key(new_key) {
            return Err(StorageError::Validation(
                "folder keys must rename to folder keys".into(),
            ));
        }
        self.rename_tree(old_key.to_string(), new_key.to_string())
            .await
    }

    fn rename_tree(&self, old_key: String, new_key: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if key::is_folder_key(&old_key) {
                let children = self
                    .store
                    .list_objects(&old_key, Some("/"))
                    .await
                    .map_err(|e| self.log_error("rename", &old_key, e))?;

                for object in children.objects {
                    if object.key == old_key {
                        continue;
                    }
                    let dest = replace_prefix(&object.key, &old_key, &new_key);
                    self.rename_tree(object.key, dest).await?;
                }
                for sub_prefix in children.common_prefixes {
                    let dest = replace_prefix(&sub_prefix, &old_key, &new_key);
                    self.rename_tree(sub_prefix, dest).await?;
                }
            }

            match self
                .store
                .head_object(&old_key)
                .await
                .map_err(|e| self.log_error("rename", &old_key, e))?
            {
                Some(meta) => {
                    self.copy_verified(&old_key, &new_key, meta.size).await?;
                }
                // A folder may exist purely as a prefix with no marker
                // object; a missing file is an error.
                None if key::is_folder_key(&old_key) => {}
                None => return Err(StorageError::NotFound(old_key.clone())),
            }
            self.store
                .delete_object(&old_key)
                .await
                .map_err(|e| self.log_error("rename", &old_key, e))
        })
    }

    /// Copy and verify before the caller deletes the source.
    async fn copy_verified(&self, source: &str, dest: &str, expected_size: u64) -> Result<()> {
        self.store
            .copy_object(source, dest)
            .await
            .map_err(|e| self.log_error("copy", source, e))?;

        let dest_meta = self
            .store
            .head_object(dest)
            .await
            .map_err(|e| self.log_error("copy", dest, e))?
            .ok_or_else(|| {
                StorageError::Transport(format!("copy verification failed: `{dest}` is missing"))
            })?;
        if dest_meta.size != expected_size {
            return Err(StorageError::Transport(format!(
                "copy verification failed: `{dest}` is {} bytes, expected {expected_size}",
                dest_meta.size
            )));
        }
        Ok(())
    }

    /// Download an object into a local directory.
    ///
    /// # Returns
    /// The path of the written file, `{dest_dir}/{file_name}`.
    pub async fn download_file(
        &self,
        key: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf> {
        if key.trim().is_empty() {
            return Err(StorageError::Validation("key cannot be empty".into()));
        }
        let body = self
            .store
            .get_object(key)
            .await
            .map_err(|e| self.log_error("download", key, e))?;

        let path = dest_dir.join(file_name);
        tokio::fs::write(&path, &body).await?;
        Ok(path)
    }

    /// Time-limited read URL for previewing an object without credentials.
    ///
    /// Valid for one hour. Absent keys fail with `NotFound` rather than
    /// producing a URL that 404s later.
    pub async fn presigned_url(&self, key: &str) -> Result<String> {
        if key.trim().is_empty() {
            return Err(StorageError::Validation("key cannot be empty".into()));
        }
        self.store
            .head_object(key)
            .await
            .map_err(|e| self.log_error("presign", key, e))?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        self.store
            .presign_get(key, SIGNED_URL_TTL_SECS)
            .await
            .map_err(|e| self.log_error("presign", key, e))
    }

    /// Log a storage-layer failure at the adapter boundary, then pass it on
    /// unchanged.
    fn log_error(&self, operation: &str, key: &str, error: StorageError) -> StorageError {
        warn!(operation, key, error = %error, "storage operation failed");
        error
    }
}

fn replace_prefix(target: &str, old_prefix: &str, new_prefix: &str) -> String {
    match target.strip_prefix(old_prefix) {
        Some(rest) => format!("{new_prefix}{rest}"),
        None => target.to_string(),
    }
}
