use chrono::{DateTime, Utc};
use roost_core::models::{Company, NewCompany};
use roost_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{conflict_on_unique, file_ref, size_column};
use crate::repository::CompanyRepository;

const COMPANY_COLUMNS: &str = "id, owner_id, name, email, description, website, location, \
     logo_location, logo_size_bytes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    email: String,
    description: String,
    website: String,
    location: String,
    logo_location: String,
    logo_size_bytes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            email: row.email,
            description: row.description,
            website: row.website,
            location: row.location,
            logo: file_ref(row.logo_location, row.logo_size_bytes),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for job board companies
#[derive(Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CompanyRepository for PgCompanyRepository {
    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select"))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, CompanyRow>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Company::from))
    }

    #[tracing::instrument(skip(self, company), fields(db.table = "companies", db.operation = "insert", owner_id = %company.owner_id))]
    async fn insert(&self, company: NewCompany) -> Result<Company, AppError> {
        let row = sqlx::query_as::<Postgres, CompanyRow>(&format!(
            r#"
            INSERT INTO companies (id, owner_id, name, email, description, website, location,
                                   logo_location, logo_size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COMPANY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(company.owner_id)
        .bind(&company.name)
        .bind(&company.email)
        .bind(&company.description)
        .bind(&company.website)
        .bind(&company.location)
        .bind(&company.logo.location)
        .bind(size_column(&company.logo))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "A company with this email already exists"))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, CompanyRow>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Company::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Company>, AppError> {
        let rows = sqlx::query_as::<Postgres, CompanyRow>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "companies", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let row = sqlx::query_as::<Postgres, CompanyRow>(&format!(
            "DELETE FROM companies WHERE id = $1 RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Company::from))
    }
}
