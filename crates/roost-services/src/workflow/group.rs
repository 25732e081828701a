use std::sync::Arc;

use roost_core::models::{CreateGroupRequest, Group, NewGroup, Page, PageRequest};
use roost_core::validation::sanitize_text;
use roost_core::{AppError, Identity};
use roost_db::GroupRepository;
use roost_processing::UploadRequest;
use roost_storage::Destination;
use uuid::Uuid;

use super::{validate_fields, EntityCreateWorkflow, MediaPolicies};

/// Chat groups. Unlike the other entities the avatar is optional.
#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    workflow: EntityCreateWorkflow,
    policies: MediaPolicies,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        workflow: EntityCreateWorkflow,
        policies: MediaPolicies,
    ) -> Self {
        Self {
            groups,
            workflow,
            policies,
        }
    }

    #[tracing::instrument(skip_all, fields(owner_id = %identity.subject_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        form: CreateGroupRequest,
        avatar: Option<UploadRequest>,
    ) -> Result<Group, AppError> {
        validate_fields(&form)?;

        let image = match avatar {
            Some(file) => Some(
                self.workflow
                    .start_upload(file, &self.policies.image, Destination::groups())
                    .wait()
                    .await?,
            ),
            None => None,
        };

        let group = self
            .workflow
            .persist(
                image.as_ref(),
                self.groups.insert(NewGroup {
                    owner_id: identity.subject_id,
                    name: sanitize_text(&form.name),
                    description: sanitize_text(&form.description),
                    image: image.clone(),
                }),
            )
            .await?;

        tracing::info!(group_id = %group.id, has_avatar = group.image.is_some(), "Group created");
        Ok(group)
    }

    pub async fn get(&self, id: Uuid) -> Result<Group, AppError> {
        self.groups
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Group>, AppError> {
        self.groups.list(page).await
    }

    #[tracing::instrument(skip_all, fields(group_id = %id))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), AppError> {
        let existing = self.get(id).await?;
        identity.ensure_owner(existing.owner_id)?;

        if let Some(group) = self.groups.delete(id).await? {
            if let Some(image) = group.image {
                self.workflow.cleanup().cleanup(image);
            }
            tracing::info!("Group deleted");
        }
        Ok(())
    }
}
