//! Byte transport for signed-URL transfers.
//!
//! Control-plane calls (list, copy, delete, presign) go through
//! [`crate::store::ObjectStore`]; the actual upload bytes travel through a
//! [`Transport`] so transfers can be exercised without a network.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StorageError};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Cumulative progress callback: `(bytes_sent, bytes_total)`.
pub type TransportProgress = Box<dyn FnMut(u64, u64) + Send>;

/// Moves local bytes to an authorized destination URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Stream a local file to a presigned PUT URL.
    ///
    /// `on_progress` receives cumulative bytes as they are handed to the
    /// wire, starting at 0. A triggered `cancel` token halts the transfer
    /// promptly and yields [`StorageError::Cancelled`]; the destination
    /// object must then be treated as absent or garbage.
    async fn put_file(
        &self,
        url: &str,
        source: &Path,
        content_type: &str,
        on_progress: TransportProgress,
        cancel: CancellationToken,
    ) -> Result<()>;
}

/// Production transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn put_file(
        &self,
        url: &str,
        source: &Path,
        content_type: &str,
        mut on_progress: TransportProgress,
        cancel: CancellationToken,
    ) -> Result<()> {
        let file = tokio::fs::File::open(source).await?;
        let total = file.metadata().await?.len();

        on_progress(0, total);

        // Count bytes as chunks are handed to the request body.
        let mut sent = 0u64;
        let counted = ReaderStream::with_capacity(file, UPLOAD_CHUNK_SIZE).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                on_progress(sent, total);
            }
            chunk
        });

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(counted))
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            result = request => result?,
        };

        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if !response.status().is_success() {
            return Err(StorageError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Test transport replaying a scripted sequence of byte acknowledgements.
#[cfg(test)]
pub(crate) struct ScriptedTransport {
    /// Total size the transport pretends the destination expects.
    pub(crate) total: u64,
    /// Cumulative bytes-sent values to acknowledge, in order.
    pub(crate) acks: Vec<u64>,
    /// When set, a successful transfer lands the source bytes here, keyed
    /// by the tail of a `memory://put/{key}` URL.
    pub(crate) store: Option<std::sync::Arc<crate::store::memory::MemoryStore>>,
}

#[cfg(test)]
#[async_trait]
impl Transport for ScriptedTransport {
    async fn put_file(
        &self,
        url: &str,
        source: &Path,
        content_type: &str,
        mut on_progress: TransportProgress,
        cancel: CancellationToken,
    ) -> Result<()> {
        for &ack in &self.acks {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            on_progress(ack, self.total);
        }
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if let Some(store) = &self.store {
            let key = url.strip_prefix("memory://put/").unwrap_or(url);
            let data = tokio::fs::read(source).await?;
            store.insert(key, data, content_type);
        }
        Ok(())
    }
}
