use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use roost_core::models::RegisterAccountRequest;
use roost_core::{Identity, MediaClass};
use roost_db::{MemoryStore, Repositories};
use roost_processing::{FileValidator, UploadRequest};
use roost_storage::{LocalStorage, Storage};
use tempfile::TempDir;

use super::MediaPolicies;
use crate::notification::{Notifier, NotifyError};
use crate::Services;

pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89,
];

pub const MP4: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, 0x66, 0x74, 0x79, 0x70, 0x6D, 0x70, 0x34, 0x32, 0x00, 0x00, 0x00,
    0x00, 0x6D, 0x70, 0x34, 0x32, 0x69, 0x73, 0x6F, 0x6D,
];

#[derive(Default)]
pub struct RecordingNotifier {
    pub verifications: Mutex<Vec<(String, String)>>,
    pub resets: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        self.verifications
            .lock()
            .unwrap()
            .push((address.to_string(), token.to_string()));
        if self.fail {
            return Err(NotifyError::Transport("smtp down".to_string()));
        }
        Ok(())
    }

    async fn send_password_reset(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        self.resets
            .lock()
            .unwrap()
            .push((address.to_string(), token.to_string()));
        if self.fail {
            return Err(NotifyError::Transport("smtp down".to_string()));
        }
        Ok(())
    }
}

pub fn policies(max_bytes: u64) -> MediaPolicies {
    MediaPolicies {
        image: Arc::new(FileValidator::new(
            MediaClass::Image,
            max_bytes,
            vec!["png".into(), "jpg".into()],
            vec!["image/png".into(), "image/jpeg".into()],
            Duration::from_secs(5),
        )),
        video: Arc::new(FileValidator::new(
            MediaClass::Video,
            max_bytes,
            vec!["mp4".into()],
            vec!["video/mp4".into()],
            Duration::from_secs(5),
        )),
    }
}

pub struct Harness {
    pub services: Services,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<dyn Storage>,
    pub notifier: Arc<RecordingNotifier>,
    pub dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default()).await
    }

    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path(), "http://localhost:4000/media".to_string())
                .await
                .unwrap(),
        );
        let store = Arc::new(MemoryStore::new());
        let repositories = Repositories::from_memory(store.clone());
        let notifier = Arc::new(notifier);
        let services = Services::new(
            repositories,
            storage.clone(),
            policies(1024),
            notifier.clone(),
        );

        Self {
            services,
            store,
            storage,
            notifier,
            dir,
        }
    }

    /// Number of files currently stored below `folder`.
    pub fn files_in(&self, folder: &str) -> usize {
        std::fs::read_dir(self.dir.path().join(folder))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub async fn png(name: &str) -> UploadRequest {
    UploadRequest::from_bytes(name, "image/png", PNG).await.unwrap()
}

pub async fn mp4(name: &str) -> UploadRequest {
    UploadRequest::from_bytes(name, "video/mp4", MP4).await.unwrap()
}

/// Let spawned cleanup and notification tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

pub fn identity_of(account: &roost_core::Account) -> Identity {
    account.identity()
}

/// Register a throwaway account and return who it authenticates as.
pub async fn member(h: &Harness, email: &str) -> Identity {
    h.services
        .accounts
        .register(
            RegisterAccountRequest {
                name: "Member".to_string(),
                email: email.to_string(),
                password: "s3cret-pass".to_string(),
                bio: String::new(),
            },
            Some(png("member.png").await),
        )
        .await
        .unwrap()
        .identity()
}
