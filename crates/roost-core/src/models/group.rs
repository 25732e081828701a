use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::file::StoredFileRef;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Chat group created by an account. The avatar is optional.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<StoredFileRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub image: Option<StoredFileRef>,
}

/// Group form fields (multipart, with an optional `avatar` file part)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 255),
        custom(function = "crate::validation::not_blank")
    )]
    pub description: String,
}

/// 1-based page window. Out of range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of rows plus the unpaged total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}
