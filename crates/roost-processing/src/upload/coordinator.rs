//! Upload coordination: validate then store on a child task, joined by the
//! caller at most once and never past the class deadline.

use std::sync::Arc;
use std::time::Duration;

use roost_core::{AppError, StoredFileRef, UploadFailure};
use roost_storage::{Destination, Storage, StorageError};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::Instrument;

use super::types::UploadRequest;
use crate::validator::{FileValidator, Rejection};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] Rejection),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("upload task ended without a result")]
    Aborted,
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected(rejection) => rejection.into(),
            UploadError::Storage(e) => AppError::Upload(UploadFailure::Storage(e.to_string())),
            UploadError::Timeout(after) => AppError::Upload(UploadFailure::Timeout(after)),
            UploadError::Aborted => AppError::Internal("Upload task aborted".to_string()),
        }
    }
}

/// Handle to an upload running in the background.
///
/// Consuming [`wait`](Self::wait) is the only way to observe the result.
#[must_use = "an upload is only observed through wait()"]
pub struct PendingUpload {
    rx: oneshot::Receiver<Result<StoredFileRef, UploadError>>,
    deadline: Instant,
    timeout: Duration,
}

impl PendingUpload {
    pub async fn wait(self) -> Result<StoredFileRef, UploadError> {
        match tokio::time::timeout_at(self.deadline, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(UploadError::Aborted),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Upload exceeded its deadline; abandoning wait"
                );
                Err(UploadError::Timeout(self.timeout))
            }
        }
    }
}

#[derive(Clone)]
pub struct UploadCoordinator {
    storage: Arc<dyn Storage>,
}

impl UploadCoordinator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Spawn the validate-then-store task and return immediately.
    ///
    /// The deadline starts now. If nobody is waiting when the task finishes
    /// (timeout already hit, or the handle was dropped) a stored file is
    /// deleted again.
    pub fn start(
        &self,
        request: UploadRequest,
        validator: Arc<FileValidator>,
        destination: Destination,
    ) -> PendingUpload {
        let timeout = validator.timeout();
        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();
        let storage = self.storage.clone();

        let span = tracing::info_span!(
            "upload",
            folder = %destination.folder,
            class = %validator.class(),
            filename = %request.declared_filename,
            size_bytes = request.declared_size,
        );

        tokio::spawn(
            async move {
                let result =
                    validate_and_store(storage.as_ref(), request, &validator, &destination).await;

                if let Err(Ok(orphan)) = tx.send(result) {
                    tracing::warn!(
                        location = %orphan.location,
                        "Upload finished after the caller gave up; deleting stored file"
                    );
                    if let Err(e) = storage.delete(&orphan.location).await {
                        tracing::warn!(
                            location = %orphan.location,
                            error = %e,
                            "Failed to delete orphaned upload"
                        );
                    }
                }
            }
            .instrument(span),
        );

        PendingUpload {
            rx,
            deadline,
            timeout,
        }
    }

    /// `start` followed by `wait`.
    pub async fn coordinate(
        &self,
        request: UploadRequest,
        validator: Arc<FileValidator>,
        destination: Destination,
    ) -> Result<StoredFileRef, UploadError> {
        self.start(request, validator, destination).wait().await
    }
}

async fn validate_and_store(
    storage: &dyn Storage,
    mut request: UploadRequest,
    validator: &FileValidator,
    destination: &Destination,
) -> Result<StoredFileRef, UploadError> {
    let start = std::time::Instant::now();

    let mime = match validator.validate(&mut request).await {
        Ok(mime) => mime,
        Err(rejection) => {
            tracing::debug!(reason = %rejection, "Upload rejected");
            return Err(rejection.into());
        }
    };

    let UploadRequest {
        source,
        declared_filename,
        declared_size,
        ..
    } = request;

    let stored = storage
        .upload_stream(
            destination,
            &declared_filename,
            mime,
            declared_size,
            source.into_reader(),
        )
        .await?;

    tracing::info!(
        location = %stored.location,
        content_type = mime,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Upload stored"
    );

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roost_core::MediaClass;
    use roost_storage::{StorageBackend, StorageResult, UploadReader};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    /// In-memory backend that can be slowed down and counts calls.
    #[derive(Default)]
    struct MemoryStorage {
        delay: Duration,
        files: Mutex<HashMap<String, Vec<u8>>>,
        uploads: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MemoryStorage {
        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Storage for MemoryStorage {
        async fn upload_stream(
            &self,
            destination: &Destination,
            filename: &str,
            _content_type: &str,
            _content_length: u64,
            mut reader: UploadReader,
        ) -> StorageResult<StoredFileRef> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let mut data = Vec::new();
            reader.read_to_end(&mut data).await?;
            let location = format!("{}/{}", destination.folder, filename);
            let size = data.len() as u64;
            self.files.lock().unwrap().insert(location.clone(), data);
            Ok(StoredFileRef::new(location, size))
        }

        async fn download(&self, location: &str) -> StorageResult<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(location)
                .cloned()
                .ok_or_else(|| StorageError::NotFound(location.to_string()))
        }

        async fn delete(&self, location: &str) -> StorageResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.files.lock().unwrap().remove(location);
            Ok(())
        }

        async fn exists(&self, location: &str) -> StorageResult<bool> {
            Ok(self.files.lock().unwrap().contains_key(location))
        }

        fn public_url(&self, location: &str) -> String {
            location.to_string()
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Local
        }
    }

    fn validator(max: u64, timeout: Duration) -> Arc<FileValidator> {
        Arc::new(FileValidator::new(
            MediaClass::Image,
            max,
            vec!["png".into()],
            vec!["image/png".into()],
            timeout,
        ))
    }

    #[tokio::test]
    async fn test_valid_upload_is_stored_byte_identical() {
        let storage = Arc::new(MemoryStorage::default());
        let coordinator = UploadCoordinator::new(storage.clone());
        let request = UploadRequest::from_bytes("a.png", "image/png", PNG).await.unwrap();

        let stored = coordinator
            .coordinate(request, validator(1024, Duration::from_secs(5)), Destination::avatars())
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, PNG.len() as u64);
        assert_eq!(storage.download(&stored.location).await.unwrap(), PNG);
    }

    #[tokio::test]
    async fn test_oversize_never_reaches_storage() {
        let storage = Arc::new(MemoryStorage::default());
        let coordinator = UploadCoordinator::new(storage.clone());
        let mut data = PNG.to_vec();
        data.resize(64, 0);
        let request = UploadRequest::from_bytes("a.png", "image/png", &data).await.unwrap();

        let err = coordinator
            .coordinate(request, validator(32, Duration::from_secs(5)), Destination::avatars())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Rejected(Rejection::Oversize { size: 64, max: 32 })
        ));
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_upload_times_out_and_orphan_is_removed() {
        let storage = Arc::new(MemoryStorage::slow(Duration::from_millis(300)));
        let coordinator = UploadCoordinator::new(storage.clone());
        let request = UploadRequest::from_bytes("a.png", "image/png", PNG).await.unwrap();

        let started = std::time::Instant::now();
        let err = coordinator
            .coordinate(request, validator(1024, Duration::from_millis(50)), Destination::avatars())
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, UploadError::Timeout(t) if t == Duration::from_millis(50)));
        assert!(elapsed < Duration::from_millis(250), "waited {:?}", elapsed);

        // the background task still finishes, then cleans up after itself
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(storage.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(storage.deletes.load(Ordering::SeqCst), 1);
        assert!(storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caller_works_while_upload_runs() {
        let storage = Arc::new(MemoryStorage::slow(Duration::from_millis(100)));
        let coordinator = UploadCoordinator::new(storage.clone());
        let request = UploadRequest::from_bytes("a.png", "image/png", PNG).await.unwrap();

        let started = std::time::Instant::now();
        let pending = coordinator.start(
            request,
            validator(1024, Duration::from_secs(5)),
            Destination::avatars(),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        let stored = pending.wait().await.unwrap();

        assert!(started.elapsed() < Duration::from_millis(190));
        assert!(storage.exists(&stored.location).await.unwrap());
    }

    #[test]
    fn test_errors_map_to_app_errors() {
        let err: AppError = UploadError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(err, AppError::Upload(UploadFailure::Timeout(_))));

        let err: AppError = UploadError::Storage(StorageError::UploadFailed("x".into())).into();
        assert!(matches!(err, AppError::Upload(UploadFailure::Storage(_))));

        let err: AppError = UploadError::Rejected(Rejection::EmptyFile).into();
        assert!(matches!(err, AppError::Upload(UploadFailure::Rejected(_))));
    }
}
