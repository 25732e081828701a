//! Authenticated upload-and-create workflows.
//!
//! Every entity holding a file goes through the same steps: validate the
//! form, start the upload, do independent work while it runs, join it,
//! persist, and hand the file to cleanup if persisting failed.

mod account;
mod company;
mod group;
mod post;
mod property;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::AccountService;
pub use company::CompanyService;
pub use group::GroupService;
pub use post::PostService;
pub use property::PropertyService;

use std::future::Future;
use std::sync::Arc;

use roost_core::{AppError, Config, MediaClass, StoredFileRef};
use roost_processing::{FileValidator, PendingUpload, UploadCoordinator, UploadRequest};
use roost_storage::Destination;
use validator::Validate;

use crate::cleanup::CleanupWorker;

/// Validators per media class, built once from configuration.
#[derive(Clone)]
pub struct MediaPolicies {
    pub image: Arc<FileValidator>,
    pub video: Arc<FileValidator>,
}

impl MediaPolicies {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image: Arc::new(FileValidator::from_limits(
                MediaClass::Image,
                config.image_limits(),
            )),
            video: Arc::new(FileValidator::from_limits(
                MediaClass::Video,
                config.video_limits(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct EntityCreateWorkflow {
    uploads: UploadCoordinator,
    cleanup: CleanupWorker,
}

impl EntityCreateWorkflow {
    pub fn new(uploads: UploadCoordinator, cleanup: CleanupWorker) -> Self {
        Self { uploads, cleanup }
    }

    pub fn cleanup(&self) -> &CleanupWorker {
        &self.cleanup
    }

    /// Hand the file to the coordinator. The returned handle must be joined
    /// before anything referencing the file is persisted.
    pub fn start_upload(
        &self,
        file: UploadRequest,
        policy: &Arc<FileValidator>,
        destination: Destination,
    ) -> PendingUpload {
        self.uploads.start(file, policy.clone(), destination)
    }

    /// Run `write` and, if it fails, schedule deletion of the file it was
    /// going to reference.
    pub async fn persist<T, Fut>(
        &self,
        uploaded: Option<&StoredFileRef>,
        write: Fut,
    ) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        match write.await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(file) = uploaded {
                    tracing::warn!(
                        location = %file.location,
                        error = %err,
                        "Persisting failed after upload; removing stored file"
                    );
                    self.cleanup.cleanup(file.clone());
                }
                Err(err)
            }
        }
    }

    /// Delete `previous` once a replacement has been committed.
    pub fn replace(&self, previous: StoredFileRef, current: &StoredFileRef) {
        if previous.location != current.location {
            self.cleanup.cleanup(previous);
        }
    }
}

/// Field validation that itemizes every failing field.
pub fn validate_fields<T: Validate>(form: &T) -> Result<(), AppError> {
    form.validate().map_err(AppError::from)
}

/// Field validation plus presence of a required file part, reported together.
pub fn require_file<T: Validate>(
    form: &T,
    file: Option<UploadRequest>,
    field: &str,
) -> Result<UploadRequest, AppError> {
    let mut errors = match validate_fields(form) {
        Ok(()) => Default::default(),
        Err(AppError::Validation(errors)) => errors,
        Err(other) => return Err(other),
    };

    match file {
        Some(file) if errors.is_empty() => Ok(file),
        Some(_) => Err(AppError::Validation(errors)),
        None => {
            errors.insert(field.to_string(), format!("{} is required", field));
            Err(AppError::Validation(errors))
        }
    }
}
