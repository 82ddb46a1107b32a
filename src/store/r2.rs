//! Cloudflare R2 backend over the S3 API.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;

use super::{ListResult, ObjectMeta, ObjectStore};
use crate::config::R2Config;
use crate::error::{Result, StorageError};

// Copy sources are sent as a header value and must be percent-encoded,
// keeping `/` intact.
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'/');

/// S3-compatible client bound to a single R2 bucket.
#[derive(Debug, Clone)]
pub struct R2Store {
    client: Client,
    bucket: String,
}

impl R2Store {
    /// Build a store client from connection settings.
    ///
    /// R2 requires path-style addressing and a custom endpoint; credentials
    /// are static keys from the account dashboard.
    pub fn new(config: &R2Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "r2-static",
        );
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
        }
    }

    /// The bucket this store operates on.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Flatten an SDK error chain into a transport error.
fn transport_error(operation: &str, err: impl std::error::Error) -> StorageError {
    StorageError::Transport(format!("{operation}: {}", DisplayErrorContext(&err)))
}

fn to_chrono(timestamp: &aws_sdk_s3::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn put_object(&self, key: &str, content_type: &str, body: Bytes) -> Result<()> {
        debug!(key, "put object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| transport_error("put object", e))?;
        Ok(())
    }

    async fn list_objects(&self, prefix: &str, delimiter: Option<&str>) -> Result<ListResult> {
        debug!(prefix, ?delimiter, "list objects");
        let mut result = ListResult::default();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_delimiter(delimiter.map(String::from))
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::List {
                prefix: prefix.to_string(),
                message: format!("{}", DisplayErrorContext(&e)),
            })?;

            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                result.objects.push(ObjectMeta {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().and_then(to_chrono),
                });
            }
            for common in page.common_prefixes() {
                if let Some(sub_prefix) = common.prefix() {
                    result.common_prefixes.push(sub_prefix.to_string());
                }
            }
        }

        Ok(result)
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        debug!(key, "delete object");
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| transport_error("delete object", e))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Bytes> {
        debug!(key, "get object");
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    StorageError::NotFound(key.to_string())
                } else {
                    transport_error("get object", e)
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| transport_error("read object body", e))?;
        Ok(body.into_bytes())
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<()> {
        debug!(source_key, dest_key, "copy object");
        let source = format!("{}/{}", self.bucket, source_key);
        let encoded = utf8_percent_encode(&source, COPY_SOURCE_ENCODE_SET).to_string();
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(encoded)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| transport_error("copy object", e))?;
        Ok(())
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let output = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => {
                return Ok(None);
            }
            Err(e) => return Err(transport_error("head object", e)),
        };

        Ok(Some(ObjectMeta {
            key: key.to_string(),
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: output.last_modified().and_then(to_chrono),
        }))
    }

    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_secs: u64,
    ) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_secs))
            .map_err(|e| transport_error("presign put", e))?;
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| transport_error("presign put", e))?;
        Ok(request.uri().to_string())
    }

    async fn presign_get(&self, key: &str, expires_secs: u64) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_secs))
            .map_err(|e| transport_error("presign get", e))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| transport_error("presign get", e))?;
        Ok(request.uri().to_string())
    }
}
