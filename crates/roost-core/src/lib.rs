//! Roost Core Library
//!
//! Domain models, error types, configuration and request validation shared by
//! every Roost crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, FieldErrors, LogLevel, UploadFailure};
pub use models::{
    Account, AccountStatus, Company, Group, Identity, MediaClass, Post, Property, StoredFileRef,
};
pub use storage_types::StorageBackend;
