//! Roost Processing Library
//!
//! Checks incoming files against a per-media-class policy and drives the
//! validate-then-store upload task that entity workflows wait on.

pub mod upload;
pub mod validator;

pub use upload::{PendingUpload, UploadCoordinator, UploadError, UploadRequest, UploadSource};
pub use validator::{FileValidator, Rejection, SNIFF_LEN};
