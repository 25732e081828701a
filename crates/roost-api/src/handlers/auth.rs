use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use roost_core::models::{
    ForgotPasswordRequest, LoginRequest, RegisterAccountRequest, ResetPasswordRequest,
};

use super::{AccountResponse, AuthResponse, MessageResponse};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

/// Register an account
///
/// Multipart fields: `name`, `email`, `password`, optional `bio`, and an
/// `avatar` image file. The account starts unverified and a verification link
/// is sent to the address.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Account created, verification pending", body = AccountResponse),
        (status = 400, description = "Invalid input, rejected avatar or duplicate email", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse),
        (status = 504, description = "Upload timeout", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "register"))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AccountResponse>), HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "avatar", state.policies.image.max_file_size()).await?;

    let request = RegisterAccountRequest {
        name: form.text_or_default("name"),
        email: form.text_or_default("email"),
        password: form.text_or_default("password"),
        bio: form.text_or_default("bio"),
    };

    let account = state
        .services
        .accounts
        .register(request, form.take_file())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            message: "Account created. Please check your email to verify your account."
                .to_string(),
            status: StatusCode::CREATED.as_u16(),
            user: account,
        }),
    ))
}

/// Follow a verification link
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Verification token from the email")),
    responses(
        (status = 200, description = "Email verified", body = AuthResponse),
        (status = 404, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "verify_email"))]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let account = state.services.accounts.verify_email(&token).await?;
    let token = state.jwt.issue(&account)?;

    Ok(Json(AuthResponse {
        message: "Email verified successfully".to_string(),
        status: StatusCode::OK.as_u16(),
        token,
        user: account,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let account = state.services.accounts.login(request).await?;
    let token = state.jwt.issue(&account)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        status: StatusCode::OK.as_u16(),
        token,
        user: account,
    }))
}

/// Request a password reset link
///
/// Always answers the same way so the response does not reveal whether the
/// address is registered.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "forgot_password"))]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.accounts.forgot_password(request).await?;

    Ok(Json(MessageResponse {
        message: "If an account exists for this email, a reset link has been sent".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}

/// Open an emailed reset link
///
/// Confirms the token is live without consuming it. The new password is
/// POSTed to the same path.
#[utoipa::path(
    get,
    path = "/api/v1/auth/reset-password/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Reset token from the email")),
    responses(
        (status = 200, description = "Token is valid", body = MessageResponse),
        (status = 404, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "check_reset_token"))]
pub async fn check_reset_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.accounts.check_reset_token(&token).await?;

    Ok(Json(MessageResponse {
        message: "Reset token is valid; submit a new password to this link".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password/{token}",
    tag = "auth",
    params(("token" = String, Path, description = "Reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = AuthResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Invalid or expired token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "reset_password"))]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, HttpAppError> {
    let account = state.services.accounts.reset_password(&token, request).await?;
    let token = state.jwt.issue(&account)?;

    Ok(Json(AuthResponse {
        message: "Password reset successfully".to_string(),
        status: StatusCode::OK.as_u16(),
        token,
        user: account,
    }))
}
