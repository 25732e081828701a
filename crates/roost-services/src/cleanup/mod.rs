use std::sync::Arc;

use roost_core::StoredFileRef;
use roost_storage::Storage;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Deletes stored files that no committed entity references any more.
///
/// Each deletion runs on its own task and only ever logs; the handle is
/// returned for tests and shutdown, callers normally drop it.
#[derive(Clone)]
pub struct CleanupWorker {
    storage: Arc<dyn Storage>,
}

impl CleanupWorker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn cleanup(&self, file: StoredFileRef) -> JoinHandle<()> {
        let storage = self.storage.clone();
        let span = tracing::info_span!("cleanup", location = %file.location);

        tokio::spawn(
            async move {
                match storage.delete(&file.location).await {
                    Ok(()) => tracing::debug!("Stored file removed"),
                    Err(e) => tracing::warn!(error = %e, "Failed to remove stored file"),
                }
            }
            .instrument(span),
        )
    }

    pub fn cleanup_all(
        &self,
        files: impl IntoIterator<Item = StoredFileRef>,
    ) -> Vec<JoinHandle<()>> {
        files.into_iter().map(|file| self.cleanup(file)).collect()
    }
}
