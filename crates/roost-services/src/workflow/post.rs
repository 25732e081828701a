use std::sync::Arc;

use roost_core::models::{
    parse_hashtags, CreatePostRequest, NewPost, Post, PostUpdate, UpdatePostRequest,
};
use roost_core::validation::sanitize_text;
use roost_core::{AppError, Identity};
use roost_db::PostRepository;
use roost_processing::UploadRequest;
use roost_storage::Destination;
use uuid::Uuid;

use super::{require_file, validate_fields, EntityCreateWorkflow, MediaPolicies};

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    workflow: EntityCreateWorkflow,
    policies: MediaPolicies,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        workflow: EntityCreateWorkflow,
        policies: MediaPolicies,
    ) -> Self {
        Self {
            posts,
            workflow,
            policies,
        }
    }

    #[tracing::instrument(skip_all, fields(owner_id = %identity.subject_id))]
    pub async fn create(
        &self,
        identity: &Identity,
        form: CreatePostRequest,
        video: Option<UploadRequest>,
    ) -> Result<Post, AppError> {
        let video = require_file(&form, video, "video")?;

        let pending = self
            .workflow
            .start_upload(video, &self.policies.video, Destination::posts());

        let new_post = NewPost {
            owner_id: identity.subject_id,
            text: sanitize_text(&form.text),
            hashtags: parse_hashtags(&form.hashtags)
                .iter()
                .map(|tag| sanitize_text(tag))
                .collect(),
            music: sanitize_text(&form.music),
            location: sanitize_text(&form.location),
            is_private: form.is_private,
            video: pending.wait().await?,
        };
        let video = new_post.video.clone();

        let post = self
            .workflow
            .persist(Some(&video), self.posts.insert(new_post))
            .await?;

        tracing::info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    /// Private posts of other accounts are reported as missing.
    pub async fn get(&self, viewer: &Identity, id: Uuid) -> Result<Post, AppError> {
        self.posts
            .find_by_id(id)
            .await?
            .filter(|post| post.visible_to(Some(viewer.subject_id)))
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    pub async fn list(&self, viewer: &Identity) -> Result<Vec<Post>, AppError> {
        self.posts.list_visible(viewer.subject_id).await
    }

    #[tracing::instrument(skip_all, fields(post_id = %id))]
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        form: UpdatePostRequest,
    ) -> Result<Post, AppError> {
        validate_fields(&form)?;
        let existing = self.find_owned(identity, id).await?;

        let update = PostUpdate {
            text: form.text.as_deref().map(sanitize_text),
            hashtags: form.hashtags.as_deref().map(|raw| {
                parse_hashtags(raw)
                    .iter()
                    .map(|tag| sanitize_text(tag))
                    .collect()
            }),
            music: form.music.as_deref().map(sanitize_text),
            location: form.location.as_deref().map(sanitize_text),
            is_private: form.is_private,
        };

        self.posts
            .update(existing.id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    #[tracing::instrument(skip_all, fields(post_id = %id))]
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), AppError> {
        self.find_owned(identity, id).await?;

        if let Some(post) = self.posts.delete(id).await? {
            self.workflow.cleanup().cleanup(post.video);
            tracing::info!("Post deleted");
        }
        Ok(())
    }

    async fn find_owned(&self, identity: &Identity, id: Uuid) -> Result<Post, AppError> {
        let post = self.get(identity, id).await?;
        identity.ensure_owner(post.owner_id)?;
        Ok(post)
    }
}
