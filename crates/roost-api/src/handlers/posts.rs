use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use roost_core::models::{CreatePostRequest, UpdatePostRequest};
use roost_core::Post;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

/// `{message?, status, post}`
#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
    pub post: Post,
}

/// `{status, data}`
#[derive(Debug, Serialize, ToSchema)]
pub struct PostListResponse {
    pub status: u16,
    pub data: Vec<Post>,
}

/// Publish a video post
///
/// Multipart fields: `text`, `hashtags` (comma separated), `music`,
/// `location`, optional `is_private`, and a `video` file.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "posts",
    security(("bearer_auth" = [])),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid input or rejected video", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse),
        (status = 504, description = "Upload timeout", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id))]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>), HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "video", state.policies.video.max_file_size()).await?;

    let request = CreatePostRequest {
        text: form.text_or_default("text"),
        hashtags: form.text_or_default("hashtags"),
        music: form.text_or_default("music"),
        location: form.text_or_default("location"),
        is_private: form.flag("is_private")?.unwrap_or(false),
    };

    let post = state
        .services
        .posts
        .create(&user, request, form.take_file())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: Some("Post created successfully".to_string()),
            status: StatusCode::CREATED.as_u16(),
            post,
        }),
    ))
}

/// Public posts plus the caller's own private ones, newest first
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible posts", body = PostListResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id))]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<PostListResponse>, HttpAppError> {
    let posts = state.services.posts.list(&user).await?;

    Ok(Json(PostListResponse {
        status: StatusCode::OK.as_u16(),
        data: posts,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, post_id = %id))]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PostResponse>, HttpAppError> {
    let post = state.services.posts.get(&user, id).await?;

    Ok(Json(PostResponse {
        message: None,
        status: StatusCode::OK.as_u16(),
        post,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(account_id = %user.subject_id, post_id = %id))]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdatePostRequest>,
) -> Result<Json<PostResponse>, HttpAppError> {
    let post = state.services.posts.update(&user, id, request).await?;

    Ok(Json(PostResponse {
        message: Some("Post updated successfully".to_string()),
        status: StatusCode::OK.as_u16(),
        post,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Post not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, post_id = %id))]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.posts.delete(&user, id).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}
