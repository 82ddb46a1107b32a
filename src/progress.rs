//! Progress reporting for file transfers.

/// Progress information for uploads and downloads.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer
    pub total: u64,
    /// Name of the file being transferred
    pub filename: String,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(done: u64, total: u64, filename: impl Into<String>) -> Self {
        Self {
            done,
            total,
            filename: filename.into(),
        }
    }

    /// Get progress as a percentage (0.0 to 100.0).
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64) * 100.0
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Type alias for progress callback function.
///
/// Cancellation is not signalled through the callback; pass a triggered
/// [`tokio_util::sync::CancellationToken`] to the transfer call instead.
pub type ProgressCallback = Box<dyn FnMut(&TransferProgress) + Send>;
