use chrono::{DateTime, Utc};
use roost_core::models::{NewProperty, Property, PropertyUpdate};
use roost_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{file_ref, missing_owner, size_column};
use crate::repository::PropertyRepository;

const PROPERTY_COLUMNS: &str = "id, owner_id, title, description, price_per_night, bedrooms, \
     guests, country, country_code, category, image_location, image_size_bytes, created_at, \
     updated_at";

#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    price_per_night: i32,
    bedrooms: i32,
    guests: i32,
    country: String,
    country_code: String,
    category: String,
    image_location: String,
    image_size_bytes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            price_per_night: row.price_per_night,
            bedrooms: row.bedrooms,
            guests: row.guests,
            country: row.country,
            country_code: row.country_code,
            category: row.category,
            image: file_ref(row.image_location, row.image_size_bytes),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for rental listings
#[derive(Clone)]
pub struct PgPropertyRepository {
    pool: PgPool,
}

impl PgPropertyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PropertyRepository for PgPropertyRepository {
    #[tracing::instrument(skip(self, property), fields(db.table = "properties", db.operation = "insert", owner_id = %property.owner_id))]
    async fn insert(&self, property: NewProperty) -> Result<Property, AppError> {
        let row = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            r#"
            INSERT INTO properties (id, owner_id, title, description, price_per_night, bedrooms,
                                    guests, country, country_code, category, image_location,
                                    image_size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(property.owner_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.price_per_night)
        .bind(property.bedrooms)
        .bind(property.guests)
        .bind(&property.country)
        .bind(&property.country_code)
        .bind(&property.category)
        .bind(&property.image.location)
        .bind(size_column(&property.image))
        .fetch_one(&self.pool)
        .await
        .map_err(missing_owner)?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "properties", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "properties", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Property>, AppError> {
        let rows = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "properties", db.operation = "select"))]
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Property>, AppError> {
        let rows = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Property::from).collect())
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "properties", db.operation = "update", db.record_id = %id))]
    async fn update(
        &self,
        id: Uuid,
        update: PropertyUpdate,
    ) -> Result<Option<Property>, AppError> {
        let image_size = update.image.as_ref().map(size_column);
        let row = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            r#"
            UPDATE properties
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                price_per_night = COALESCE($4, price_per_night),
                bedrooms = COALESCE($5, bedrooms),
                guests = COALESCE($6, guests),
                country = COALESCE($7, country),
                country_code = COALESCE($8, country_code),
                category = COALESCE($9, category),
                image_location = COALESCE($10, image_location),
                image_size_bytes = COALESCE($11, image_size_bytes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROPERTY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.price_per_night)
        .bind(update.bedrooms)
        .bind(update.guests)
        .bind(update.country)
        .bind(update.country_code)
        .bind(update.category)
        .bind(update.image.map(|i| i.location))
        .bind(image_size)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "properties", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<Postgres, PropertyRow>(&format!(
            "DELETE FROM properties WHERE id = $1 RETURNING {PROPERTY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Property::from))
    }
}
