//! Roost Storage Library
//!
//! The [`Storage`] trait and its backends: the local filesystem and a media CDN
//! reached over HTTP.
//!
//! # Location format
//!
//! Local files are addressed by a path relative to the storage root:
//! `{folder}/{stem}_{suffix}.{ext}`, e.g. `avatars/portrait_1730000000000000001.png`.
//! The suffix is a process-wide strictly increasing nanosecond timestamp so two
//! uploads never share a name. CDN files are addressed by the secure URL the
//! provider returns.
//!
//! Locations must not contain `..` or a leading `/`.

#[cfg(feature = "storage-cdn")]
pub mod cdn;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

#[cfg(feature = "storage-cdn")]
pub use cdn::{CdnConfig, CdnStorage};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use roost_core::StorageBackend;
pub use traits::{Destination, Storage, StorageError, StorageResult, UploadReader};
