use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::file::StoredFileRef;

/// Rental listing owned by an account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_per_night: i32,
    pub bedrooms: i32,
    pub guests: i32,
    pub country: String,
    pub country_code: String,
    pub category: String,
    pub image: StoredFileRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_per_night: i32,
    pub bedrooms: i32,
    pub guests: i32,
    pub country: String,
    pub country_code: String,
    pub category: String,
    pub image: StoredFileRef,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<i32>,
    pub bedrooms: Option<i32>,
    pub guests: Option<i32>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub category: Option<String>,
    pub image: Option<StoredFileRef>,
}

/// Listing form fields (multipart, with an `image` file part)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePropertyRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub description: String,
    #[validate(range(min = 1))]
    pub price_per_night: i32,
    #[validate(range(min = 1))]
    pub bedrooms: i32,
    #[validate(range(min = 1))]
    pub guests: i32,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub country: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub country_code: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePropertyRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub price_per_night: Option<i32>,
    #[validate(range(min = 1))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 1))]
    pub guests: Option<i32>,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub country: Option<String>,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub country_code: Option<String>,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub category: Option<String>,
}
