use crate::keys::validate_key;
use crate::signing::UrlSigner;
use crate::traits::{ObjectInfo, PutOptions, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Downloads are served by the portal at `{base_url}/files/{token}` where the token is
/// minted by [`UrlSigner`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signer: UrlSigner,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/portal/documents")
    /// * `base_url` - Public base URL of the portal (e.g., "http://localhost:4000")
    /// * `signer` - Signs download tokens
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signer: UrlSigner,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signer,
        })
    }

    /// Convert storage key to filesystem path, rejecting keys that escape the root.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
        options: PutOptions,
    ) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.overwrite {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(key.to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(())
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::BackendError(e.to_string())),
            };

            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(key) = self.path_to_key(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }
                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                objects.push(ObjectInfo {
                    key,
                    size: metadata.len(),
                    last_modified,
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn remove(&self, keys: &[String]) -> StorageResult<()> {
        let mut failed = Vec::new();

        for key in keys {
            let path = self.key_to_path(key)?;
            match fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(key = %key, "Local delete successful"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::error!(error = %e, key = %key, "Local delete failed");
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
        let token = self.signer.sign(key, expires_in)?;
        Ok(format!(
            "{}/files/{}",
            self.base_url.trim_end_matches('/'),
            token
        ))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn verify_download_token(&self, token: &str) -> StorageResult<String> {
        let key = self.signer.verify(token)?;
        validate_key(&key)?;
        Ok(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir,
            "http://localhost:4000".to_string(),
            UrlSigner::new("test-signing-secret"),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_download_and_list() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("acme/1_iso.pdf", b"iso".to_vec(), "application/pdf", PutOptions::default())
            .await
            .unwrap();
        storage
            .put("beta/2_hr.pdf", b"hr".to_vec(), "application/pdf", PutOptions::default())
            .await
            .unwrap();

        assert_eq!(storage.download("acme/1_iso.pdf").await.unwrap(), b"iso");

        let all = storage.list("").await.unwrap();
        assert_eq!(all.len(), 2);
        let acme = storage.list("acme/").await.unwrap();
        assert_eq!(acme.len(), 1);
        assert_eq!(acme[0].key, "acme/1_iso.pdf");
        assert_eq!(acme[0].size, 3);
    }

    #[tokio::test]
    async fn test_put_without_overwrite_rejects_existing_key() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("acme/1_a.pdf", b"one".to_vec(), "application/pdf", PutOptions::default())
            .await
            .unwrap();
        let second = storage
            .put("acme/1_a.pdf", b"two".to_vec(), "application/pdf", PutOptions::default())
            .await;
        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));

        storage
            .put(
                "acme/1_a.pdf",
                b"two".to_vec(),
                "application/pdf",
                PutOptions { overwrite: true },
            )
            .await
            .unwrap();
        assert_eq!(storage.download("acme/1_a.pdf").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_remove_ignores_missing_keys() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .put("acme/1_a.pdf", b"a".to_vec(), "application/pdf", PutOptions::default())
            .await
            .unwrap();
        storage
            .remove(&["acme/1_a.pdf".to_string(), "acme/missing.pdf".to_string()])
            .await
            .unwrap();
        assert!(!storage.exists("acme/1_a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_signed_url_resolves_to_key() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let url = storage
            .signed_url("acme/1_a.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        let token = url
            .strip_prefix("http://localhost:4000/files/")
            .expect("url under /files");
        assert_eq!(storage.verify_download_token(token).unwrap(), "acme/1_a.pdf");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.remove(&["../etc/passwd".to_string()]).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
