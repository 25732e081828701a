//! Roost Services Layer
//!
//! Business services on top of persistence, storage and upload coordination.
//! The API crate stays a thin HTTP layer over the facade exported here.

pub mod cleanup;
pub mod notification;
pub mod security;
pub mod workflow;

use std::sync::Arc;

use roost_db::Repositories;
use roost_processing::UploadCoordinator;
use roost_storage::Storage;

pub use cleanup::CleanupWorker;
pub use notification::{create_notifier, LogNotifier, Notifier, NotifyError};
#[cfg(feature = "email")]
pub use notification::SmtpNotifier;
pub use workflow::{
    AccountService, CompanyService, EntityCreateWorkflow, GroupService, MediaPolicies,
    PostService, PropertyService,
};

/// Every service, wired against the same repositories and storage.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub posts: PostService,
    pub properties: PropertyService,
    pub groups: GroupService,
    pub companies: CompanyService,
    pub cleanup: CleanupWorker,
}

impl Services {
    pub fn new(
        repositories: Repositories,
        storage: Arc<dyn Storage>,
        policies: MediaPolicies,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cleanup = CleanupWorker::new(storage.clone());
        let workflow = EntityCreateWorkflow::new(UploadCoordinator::new(storage), cleanup.clone());

        Self {
            accounts: AccountService::new(
                repositories.clone(),
                workflow.clone(),
                policies.clone(),
                notifier,
            ),
            posts: PostService::new(repositories.posts.clone(), workflow.clone(), policies.clone()),
            properties: PropertyService::new(
                repositories.properties.clone(),
                workflow.clone(),
                policies.clone(),
            ),
            groups: GroupService::new(repositories.groups.clone(), workflow.clone(), policies.clone()),
            companies: CompanyService::new(repositories.companies, workflow, policies),
            cleanup,
        }
    }
}
