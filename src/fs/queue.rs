//! Sequential upload queue.
//!
//! Uploads are processed strictly one at a time: the next item is dequeued
//! only after the previous settles as completed, cancelled, or failed. A
//! failure or cancellation of one item never stops the rest of the queue.

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::fs::operations::Drive;
use crate::fs::upload::UploadRequest;
use crate::progress::{ProgressCallback, TransferProgress};

/// How a queued upload settled.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Upload finished; the object is stored under `key`.
    Completed { key: String },
    /// The item's cancellation token was triggered.
    Cancelled,
    /// The upload failed; `message` preserves the error detail.
    Failed { message: String },
}

impl UploadOutcome {
    /// True if the upload finished successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed { .. })
    }
}

/// Per-item result returned by [`UploadQueue::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    /// File name of the queued request.
    pub file_name: String,
    /// How the upload settled.
    pub outcome: UploadOutcome,
}

/// Progress notifications emitted while the queue runs.
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// An item's transfer began.
    Started { index: usize, file_name: String },
    /// Progress for the in-flight item.
    Progress {
        index: usize,
        progress: TransferProgress,
    },
    /// An item finished successfully.
    Completed { index: usize, key: String },
    /// An item's token was triggered.
    Cancelled { index: usize },
    /// An item failed.
    Failed { index: usize, message: String },
}

struct QueuedItem {
    request: UploadRequest,
    token: CancellationToken,
}

/// Strictly sequential upload queue.
///
/// Each enqueued item gets its own child cancellation token, handed back to
/// the call site; a token triggers at most once and affects only its item.
/// The queue-level handle from [`UploadQueue::cancel_handle`] cancels
/// everything still pending.
#[derive(Default)]
pub struct UploadQueue {
    items: Vec<QueuedItem>,
    root: CancellationToken,
}

impl UploadQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request; returns the token that cancels this item.
    pub fn enqueue(&mut self, request: UploadRequest) -> CancellationToken {
        let token = self.root.child_token();
        self.items.push(QueuedItem {
            request,
            token: token.clone(),
        });
        token
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Token that cancels the in-flight item and everything still pending.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Process every item in order, one in-flight transfer at a time.
    ///
    /// Events are pushed through `events` as items start, report progress,
    /// and settle; sending is best-effort and a dropped receiver does not
    /// interrupt the queue.
    ///
    /// # Returns
    /// One report per item, in queue order.
    pub async fn run(self, drive: &Drive, events: UnboundedSender<QueueEvent>) -> Vec<UploadReport> {
        let mut reports = Vec::with_capacity(self.items.len());

        for (index, item) in self.items.into_iter().enumerate() {
            let file_name = item.request.file_name.clone();
            let _ = events.send(QueueEvent::Started {
                index,
                file_name: file_name.clone(),
            });

            let progress_events = events.clone();
            let on_progress: ProgressCallback = Box::new(move |progress| {
                let _ = progress_events.send(QueueEvent::Progress {
                    index,
                    progress: progress.clone(),
                });
            });

            let result = drive
                .upload_file(
                    &item.request.source,
                    &item.request.file_name,
                    on_progress,
                    item.token,
                )
                .await;

            let outcome = match result {
                Ok(key) => {
                    let _ = events.send(QueueEvent::Completed {
                        index,
                        key: key.clone(),
                    });
                    UploadOutcome::Completed { key }
                }
                Err(error) if error.is_cancelled() => {
                    let _ = events.send(QueueEvent::Cancelled { index });
                    UploadOutcome::Cancelled
                }
                Err(error) => {
                    warn!(file_name = %file_name, error = %error, "queued upload failed");
                    let message = error.to_string();
                    let _ = events.send(QueueEvent::Failed {
                        index,
                        message: message.clone(),
                    });
                    UploadOutcome::Failed { message }
                }
            };
            reports.push(UploadReport { file_name, outcome });
        }

        reports
    }
}
