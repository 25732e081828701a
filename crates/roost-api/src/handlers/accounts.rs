use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use roost_core::models::UpdateProfileRequest;
use roost_core::Account;
use serde::Serialize;
use utoipa::ToSchema;

use super::{AccountResponse, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

/// `{status, user}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub status: u16,
    pub user: Account,
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/me",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = ProfileResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id))]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, HttpAppError> {
    let account = state.services.accounts.profile(&user).await?;

    Ok(Json(ProfileResponse {
        status: StatusCode::OK.as_u16(),
        user: account,
    }))
}

/// Update the current account
///
/// Multipart fields, all optional: `name`, `bio`, `password`, and an `avatar`
/// image that replaces the previous one.
#[utoipa::path(
    put,
    path = "/api/v1/accounts/me",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid input or rejected avatar", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Json<AccountResponse>, HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "avatar", state.policies.image.max_file_size()).await?;

    let request = UpdateProfileRequest {
        name: form.text("name"),
        bio: form.text("bio"),
        password: form.text("password").filter(|p| !p.is_empty()),
    };

    let account = state
        .services
        .accounts
        .update_profile(&user, request, form.take_file())
        .await?;

    Ok(Json(AccountResponse {
        message: "Account updated successfully".to_string(),
        status: StatusCode::OK.as_u16(),
        user: account,
    }))
}

/// Delete the current account with its posts, properties and files
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/me",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id))]
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.accounts.delete_account(&user).await?;

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}
