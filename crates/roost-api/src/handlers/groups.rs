use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use roost_core::models::{CreateGroupRequest, PageRequest};
use roost_core::Group;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupData {
    pub group: Group,
}

/// `{message?, status, data: {group}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
    pub data: GroupData,
}

/// `{status, data, total, page, limit}`
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupListResponse {
    pub status: u16,
    pub data: Vec<Group>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GroupListQuery {
    /// 1-based page, default 1
    pub page: Option<u32>,
    /// Page size, default 10, at most 100
    pub limit: Option<u32>,
}

/// Create a chat group
///
/// Multipart fields: `name`, `description`, and an optional `avatar` file.
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "groups",
    security(("bearer_auth" = [])),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 400, description = "Invalid input or rejected image", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse),
        (status = 504, description = "Upload timeout", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id))]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GroupResponse>), HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "avatar", state.policies.image.max_file_size()).await?;

    let request = CreateGroupRequest {
        name: form.text_or_default("name"),
        description: form.text_or_default("description"),
    };

    let group = state
        .services
        .groups
        .create(&user, request, form.take_file())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            message: Some("Group created successfully".to_string()),
            status: StatusCode::CREATED.as_u16(),
            data: GroupData { group },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(GroupListQuery),
    responses(
        (status = 200, description = "One page of groups, newest first", body = GroupListResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id))]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GroupListQuery>,
) -> Result<Json<GroupListResponse>, HttpAppError> {
    let page = state
        .services
        .groups
        .list(PageRequest::new(query.page, query.limit))
        .await?;

    Ok(Json(GroupListResponse {
        status: StatusCode::OK.as_u16(),
        data: page.items,
        total: page.total,
        page: page.request.page,
        limit: page.request.limit,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, group_id = %id))]
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupResponse>, HttpAppError> {
    let group = state.services.groups.get(id).await?;

    Ok(Json(GroupResponse {
        message: None,
        status: StatusCode::OK.as_u16(),
        data: GroupData { group },
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}",
    tag = "groups",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, group_id = %id))]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.groups.delete(&user, id).await?;

    Ok(Json(MessageResponse {
        message: "Group deleted successfully".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}
