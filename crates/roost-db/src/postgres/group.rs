use chrono::{DateTime, Utc};
use roost_core::models::{Group, NewGroup, Page, PageRequest};
use roost_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{file_ref, missing_owner, size_column};
use crate::repository::GroupRepository;

const GROUP_COLUMNS: &str =
    "id, owner_id, name, description, image_location, image_size_bytes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    image_location: Option<String>,
    image_size_bytes: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        let image = match (row.image_location, row.image_size_bytes) {
            (Some(location), Some(size)) => Some(file_ref(location, size)),
            _ => None,
        };
        Group {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for chat groups
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GroupRepository for PgGroupRepository {
    #[tracing::instrument(skip(self, group), fields(db.table = "groups", db.operation = "insert", owner_id = %group.owner_id))]
    async fn insert(&self, group: NewGroup) -> Result<Group, AppError> {
        let row = sqlx::query_as::<Postgres, GroupRow>(&format!(
            r#"
            INSERT INTO groups (id, owner_id, name, description, image_location, image_size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(group.owner_id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.image.as_ref().map(|i| i.location.clone()))
        .bind(group.image.as_ref().map(size_column))
        .fetch_one(&self.pool)
        .await
        .map_err(missing_owner)?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "groups", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, AppError> {
        let row = sqlx::query_as::<Postgres, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "groups", db.operation = "select", page = page.page, limit = page.limit))]
    async fn list(&self, page: PageRequest) -> Result<Page<Group>, AppError> {
        let total = sqlx::query_scalar::<Postgres, i64>("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<Postgres, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items: rows.into_iter().map(Group::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
            request: page,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "groups", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<Group>, AppError> {
        let row = sqlx::query_as::<Postgres, GroupRow>(&format!(
            "DELETE FROM groups WHERE id = $1 RETURNING {GROUP_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Group::from))
    }
}
