//! # nxtcloud
//!
//! Rust client library for an R2-backed personal cloud drive.
//!
//! The store is a flat key-value object store with no directory concept;
//! this crate layers a virtual filesystem on top of it using key-prefix
//! conventions: folder keys end in `/`, file keys are `{uuid}-{name}`, and
//! folder metadata (file count, total size, last modified) is reconstructed
//! by recursive listing.
//!
//! ## Features
//!
//! - **Browsing**: two-list views (files, folders) per path, with subtree
//!   aggregates computed per folder.
//! - **Folder operations**: create, rename, and recursively delete virtual
//!   folders; move files between folders via verified copy-then-delete.
//! - **Transfers**: signed-URL uploads with progress callbacks and prompt
//!   cooperative cancellation; downloads to local files; presigned preview
//!   URLs.
//! - **Upload queue**: strictly sequential processing with per-item
//!   cancellation tokens and a progress event stream.
//!
//! Mutations are independent calls with no cross-operation transactions;
//! re-list after a mutation to observe a consistent view.
//!
//! ## Example: Basic Usage
//!
//! ```no_run
//! use nxtcloud::{Drive, R2Config};
//!
//! # async fn example() -> nxtcloud::Result<()> {
//! let config = R2Config::from_env()?;
//! let drive = Drive::connect(&config);
//!
//! // List the root
//! let listing = drive.list_files("").await?;
//! for file in &listing.files {
//!     println!("{} ({} bytes)", file.display_name(""), file.size);
//! }
//!
//! // Create a folder and move a file into it
//! let folder = drive.create_folder("Photos", "").await?;
//! if let Some(file) = listing.files.first() {
//!     drive.move_file(&file.key, &folder).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Upload with progress and cancellation
//!
//! ```no_run
//! use std::path::Path;
//! use nxtcloud::{Drive, R2Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> nxtcloud::Result<()> {
//! let drive = Drive::connect(&R2Config::from_env()?);
//! let cancel = CancellationToken::new();
//!
//! let key = drive
//!     .upload_file(
//!         Path::new("cat.png"),
//!         "cat.png",
//!         Box::new(|progress| println!("{:.0}%", progress.percent())),
//!         cancel,
//!     )
//!     .await?;
//! println!("stored as {key}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod key;
pub mod mime;
pub mod progress;
pub mod stats;
pub mod store;
pub mod transfer;

// Re-export commonly used types
pub use config::R2Config;
pub use error::{Result, StorageError};
pub use fs::{
    Drive, FileEntry, FolderEntry, Listing, QueueEvent, UploadOutcome, UploadQueue, UploadReport,
    UploadRequest,
};
pub use progress::{ProgressCallback, TransferProgress};
pub use stats::{format_bytes, StorageStats};
pub use store::{ListResult, ObjectMeta, ObjectStore, R2Store, SIGNED_URL_TTL_SECS};
pub use transfer::{HttpTransport, Transport};
