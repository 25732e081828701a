use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::file::StoredFileRef;

/// Employer profile on the job board. `email` is unique, case-insensitively.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub logo: StoredFileRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub description: String,
    pub website: String,
    pub location: String,
    pub logo: StoredFileRef,
}

/// Company form fields (multipart, with a `logo` file part)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterCompanyRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub name: String,
    #[validate(email, length(max = 255))]
    #[schema(example = "jobs@acme.test")]
    pub email: String,
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "crate::validation::not_blank")
    )]
    pub description: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub website: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub location: String,
}
