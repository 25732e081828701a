use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use roost_core::models::RegisterCompanyRequest;
use roost_core::Company;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyData {
    pub company: Company,
}

/// `{message?, status, data: {company}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
    pub data: CompanyData,
}

/// `{status, data}`
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyListResponse {
    pub status: u16,
    pub data: Vec<Company>,
}

/// Register a company
///
/// Multipart fields: `name`, `email`, `description`, `website`, `location`,
/// and a `logo` file.
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    tag = "companies",
    security(("bearer_auth" = [])),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Company registered", body = CompanyResponse),
        (status = 400, description = "Invalid input, taken email or rejected logo", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse),
        (status = 504, description = "Upload timeout", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id))]
pub async fn register_company(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CompanyResponse>), HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "logo", state.policies.image.max_file_size()).await?;

    let request = RegisterCompanyRequest {
        name: form.text_or_default("name"),
        email: form.text_or_default("email"),
        description: form.text_or_default("description"),
        website: form.text_or_default("website"),
        location: form.text_or_default("location"),
    };

    let company = state
        .services
        .companies
        .register(&user, request, form.take_file())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CompanyResponse {
            message: Some("Company registered successfully".to_string()),
            status: StatusCode::CREATED.as_u16(),
            data: CompanyData { company },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "companies",
    responses(
        (status = 200, description = "Companies, newest first", body = CompanyListResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompanyListResponse>, HttpAppError> {
    let companies = state.services.companies.list().await?;

    Ok(Json(CompanyListResponse {
        status: StatusCode::OK.as_u16(),
        data: companies,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    tag = "companies",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(company_id = %id))]
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, HttpAppError> {
    let company = state.services.companies.get(id).await?;

    Ok(Json(CompanyResponse {
        message: None,
        status: StatusCode::OK.as_u16(),
        data: CompanyData { company },
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    tag = "companies",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, company_id = %id))]
pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.companies.delete(&user, id).await?;

    Ok(Json(MessageResponse {
        message: "Company deleted successfully".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}
