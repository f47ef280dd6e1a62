use crate::keys::validate_key;
use crate::traits::{ObjectInfo, PutOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutMode, PutPayload, Result as ObjectResult};
use std::time::Duration;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage { store, bucket })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
        options: PutOptions,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let mode = if options.overwrite {
            PutMode::Overwrite
        } else {
            PutMode::Create
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            &self.store,
            &location,
            PutPayload::from(Bytes::from(data)),
            mode.into(),
        )
        .await;

        result.map_err(|e| match e {
            ObjectStoreError::AlreadyExists { .. } => StorageError::AlreadyExists(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(other.to_string())
            }
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let start = std::time::Instant::now();
        let prefix_path = if prefix.is_empty() {
            None
        } else {
            Some(Path::from(prefix.to_string()))
        };

        let metas: Vec<_> = object_store::ObjectStore::list(&self.store, prefix_path.as_ref())
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, prefix = %prefix, "S3 list failed");
                StorageError::BackendError(e.to_string())
            })?;

        let objects: Vec<ObjectInfo> = metas
            .into_iter()
            .map(|meta| ObjectInfo {
                key: meta.location.to_string(),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            })
            .filter(|object| object.key.starts_with(prefix))
            .collect();

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %prefix,
            count = objects.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(objects)
    }

    async fn remove(&self, keys: &[String]) -> StorageResult<()> {
        let mut failed = Vec::new();

        for key in keys {
            validate_key(key)?;
            let location = Path::from(key.clone());
            let result: ObjectResult<_> = self.store.delete(&location).await;
            match result {
                Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {
                    tracing::debug!(bucket = %self.bucket, key = %key, "S3 delete successful");
                }
                Err(e) => {
                    tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 delete failed");
                    failed.push(key.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StorageError::DeleteFailed(failed.join(", ")))
        }
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
