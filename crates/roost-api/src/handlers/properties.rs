use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use roost_core::models::{CreatePropertyRequest, UpdatePropertyRequest};
use roost_core::{AppError, Property};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::MultipartForm;

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyData {
    pub property: Property,
}

/// `{message?, status, data: {property}}`
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
    pub data: PropertyData,
}

/// `{status, data}`
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyListResponse {
    pub status: u16,
    pub data: Vec<Property>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PropertyListQuery {
    /// Only listings owned by this account
    pub owner_id: Option<Uuid>,
}

/// Integer fields are required on create; a missing one is reported by range validation.
fn required_int(form: &MultipartForm, name: &str) -> Result<i32, AppError> {
    Ok(form.int(name)?.unwrap_or(0))
}

/// Create a listing
///
/// Multipart fields: `title`, `description`, `price_per_night`, `bedrooms`,
/// `guests`, `country`, `country_code`, `category`, and an `image` file.
#[utoipa::path(
    post,
    path = "/api/v1/properties",
    tag = "properties",
    security(("bearer_auth" = [])),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Property created", body = PropertyResponse),
        (status = 400, description = "Invalid input or rejected image", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credential", body = ErrorResponse),
        (status = 502, description = "Storage backend failure", body = ErrorResponse),
        (status = 504, description = "Upload timeout", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id))]
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PropertyResponse>), HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "image", state.policies.image.max_file_size()).await?;

    let request = CreatePropertyRequest {
        title: form.text_or_default("title"),
        description: form.text_or_default("description"),
        price_per_night: required_int(&form, "price_per_night")?,
        bedrooms: required_int(&form, "bedrooms")?,
        guests: required_int(&form, "guests")?,
        country: form.text_or_default("country"),
        country_code: form.text_or_default("country_code"),
        category: form.text_or_default("category"),
    };

    let property = state
        .services
        .properties
        .create(&user, request, form.take_file())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PropertyResponse {
            message: Some("Property created successfully".to_string()),
            status: StatusCode::CREATED.as_u16(),
            data: PropertyData { property },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "properties",
    params(PropertyListQuery),
    responses(
        (status = 200, description = "Listings, newest first", body = PropertyListResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PropertyListQuery>,
) -> Result<Json<PropertyListResponse>, HttpAppError> {
    let properties = match query.owner_id {
        Some(owner_id) => state.services.properties.list_by_owner(owner_id).await?,
        None => state.services.properties.list().await?,
    };

    Ok(Json(PropertyListResponse {
        status: StatusCode::OK.as_u16(),
        data: properties,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property", body = PropertyResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(property_id = %id))]
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyResponse>, HttpAppError> {
    let property = state.services.properties.get(id).await?;

    Ok(Json(PropertyResponse {
        message: None,
        status: StatusCode::OK.as_u16(),
        data: PropertyData { property },
    }))
}

/// Update a listing
///
/// Any subset of the create fields, plus an optional replacement `image`.
#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Property updated", body = PropertyResponse),
        (status = 400, description = "Invalid input or rejected image", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(account_id = %user.subject_id, property_id = %id))]
pub async fn update_property(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<PropertyResponse>, HttpAppError> {
    let mut form =
        MultipartForm::read(multipart, "image", state.policies.image.max_file_size()).await?;

    let request = UpdatePropertyRequest {
        title: form.text("title"),
        description: form.text("description"),
        price_per_night: form.int("price_per_night")?,
        bedrooms: form.int("bedrooms")?,
        guests: form.int("guests")?,
        country: form.text("country"),
        country_code: form.text("country_code"),
        category: form.text("category"),
    };

    let property = state
        .services
        .properties
        .update(&user, id, request, form.take_file())
        .await?;

    Ok(Json(PropertyResponse {
        message: Some("Property updated successfully".to_string()),
        status: StatusCode::OK.as_u16(),
        data: PropertyData { property },
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property deleted", body = MessageResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(account_id = %user.subject_id, property_id = %id))]
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.services.properties.delete(&user, id).await?;

    Ok(Json(MessageResponse {
        message: "Property deleted successfully".to_string(),
        status: StatusCode::OK.as_u16(),
    }))
}
