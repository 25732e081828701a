//! Upload pipeline: spool → validate → store, run off the request task.

mod coordinator;
mod types;

pub use coordinator::{PendingUpload, UploadCoordinator, UploadError};
pub use types::{UploadRequest, UploadSource};
