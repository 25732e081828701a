//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use roost_core::{MediaClass, StoredFileRef};
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage location: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte source handed to a backend. Must already be positioned at offset 0.
pub type UploadReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Where an upload lands: a namespace folder plus the media class, which picks
/// the CDN resource type and transformation profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub folder: String,
    pub media_class: MediaClass,
}

impl Destination {
    pub fn new(folder: impl Into<String>, media_class: MediaClass) -> Self {
        Self {
            folder: folder.into(),
            media_class,
        }
    }

    pub fn avatars() -> Self {
        Self::new("avatars", MediaClass::Image)
    }

    pub fn posts() -> Self {
        Self::new("posts", MediaClass::Video)
    }

    pub fn properties() -> Self {
        Self::new("properties", MediaClass::Image)
    }

    pub fn groups() -> Self {
        Self::new("groups", MediaClass::Image)
    }

    pub fn companies() -> Self {
        Self::new("companies", MediaClass::Image)
    }
}

/// Storage abstraction trait
///
/// Every backend stores a validated byte stream under a collision-resistant
/// name and hands back a [`StoredFileRef`] whose `location` it can later
/// resolve, test for, or delete.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist the reader's bytes (until EOF) and return where they went.
    ///
    /// `filename` is the client's original name; backends only borrow its
    /// stem and extension.
    async fn upload_stream(
        &self,
        destination: &Destination,
        filename: &str,
        content_type: &str,
        content_length: u64,
        reader: UploadReader,
    ) -> StorageResult<StoredFileRef>;

    /// Read back the full content at `location`
    async fn download(&self, location: &str) -> StorageResult<Vec<u8>>;

    /// Delete the file at `location`. Deleting something already gone succeeds.
    async fn delete(&self, location: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, location: &str) -> StorageResult<bool>;

    /// Client-facing URL for a stored location
    fn public_url(&self, location: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
