//! Virtual filesystem over flat object keys.

pub mod entry;
pub mod operations;
pub mod queue;
pub mod upload;

pub use entry::{FileEntry, FolderEntry, Listing};
pub use operations::Drive;
pub use queue::{QueueEvent, UploadOutcome, UploadQueue, UploadReport};
pub use upload::UploadRequest;
