use crate::keys;
use crate::traits::{Destination, Storage, StorageError, StorageResult, UploadReader};
use crate::StorageBackend;
use async_trait::async_trait;
use roost_core::StoredFileRef;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/roost/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
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
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a location to a filesystem path, refusing anything that could
    /// escape the storage root.
    fn key_to_path(&self, location: &str) -> StorageResult<PathBuf> {
        if !keys::is_safe_key(location) {
            return Err(StorageError::InvalidKey(format!(
                "Location contains invalid characters: {}",
                location
            )));
        }
        Ok(self.base_path.join(location))
    }

    /// `create_dir_all` succeeds when the directory already exists, including
    /// when a concurrent upload created it first.
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_stream(
        &self,
        destination: &Destination,
        filename: &str,
        _content_type: &str,
        _content_length: u64,
        mut reader: UploadReader,
    ) -> StorageResult<StoredFileRef> {
        let key = keys::storage_key(&destination.folder, &keys::unique_filename(filename));
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let bytes_copied = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&path).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(StoredFileRef::new(key, bytes_copied))
    }

    async fn download(&self, location: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(location)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(location.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, location: &str) -> StorageResult<()> {
        let path = self.key_to_path(location)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    key = %location,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %location, "Local storage delete: already absent");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, location: &str) -> StorageResult<bool> {
        let path = self.key_to_path(location)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_url(&self, location: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), location)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_core::MediaClass;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn reader(data: &[u8]) -> UploadReader {
        Box::pin(Cursor::new(data.to_vec()))
    }

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:4000/media".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_download_is_byte_identical() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let data: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();

        let stored = storage
            .upload_stream(
                &Destination::properties(),
                "house.png",
                "image/png",
                data.len() as u64,
                reader(&data),
            )
            .await
            .unwrap();

        assert!(stored.location.starts_with("properties/house_"));
        assert!(stored.location.ends_with(".png"));
        assert_eq!(stored.size_bytes, data.len() as u64);
        assert_eq!(storage.download(&stored.location).await.unwrap(), data);
        assert_eq!(
            storage.public_url(&stored.location),
            format!("http://localhost:4000/media/{}", stored.location)
        );
    }

    #[tokio::test]
    async fn test_same_filename_never_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let destination = Destination::avatars();

        let first = storage
            .upload_stream(&destination, "me.png", "image/png", 3, reader(b"one"))
            .await
            .unwrap();
        let second = storage
            .upload_stream(&destination, "me.png", "image/png", 3, reader(b"two"))
            .await
            .unwrap();

        assert_ne!(first.location, second.location);
        assert_eq!(storage.download(&first.location).await.unwrap(), b"one");
        assert_eq!(storage.download(&second.location).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_concurrent_uploads_create_destination_once() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(storage(dir.path()).await);
        let destination = Destination::new("fresh/nested", MediaClass::Image);

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let storage = storage.clone();
                let destination = destination.clone();
                tokio::spawn(async move {
                    let body = format!("file-{}", i).into_bytes();
                    storage
                        .upload_stream(&destination, "x.png", "image/png", 0, reader(&body))
                        .await
                })
            })
            .collect();

        let mut locations = std::collections::HashSet::new();
        for task in tasks {
            let stored = task.await.unwrap().unwrap();
            assert!(locations.insert(stored.location));
        }
        assert_eq!(locations.len(), 16);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let stored = storage
            .upload_stream(&Destination::avatars(), "a.png", "image/png", 1, reader(b"a"))
            .await
            .unwrap();

        assert!(storage.exists(&stored.location).await.unwrap());
        storage.delete(&stored.location).await.unwrap();
        storage.delete(&stored.location).await.unwrap();
        assert!(!storage.exists(&stored.location).await.unwrap());
        assert!(matches!(
            storage.download(&stored.location).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert!(matches!(
            storage.delete("../outside.txt").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            storage.download("/etc/passwd").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
