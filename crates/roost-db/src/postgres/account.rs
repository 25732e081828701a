use chrono::{DateTime, Utc};
use roost_core::models::{Account, AccountUpdate, DeletedAccount, NewAccount};
use roost_core::{AppError, StoredFileRef};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{conflict_on_unique, file_ref, size_column};
use crate::repository::AccountRepository;

/// Owned tables and the file columns each row carries, in delete order.
const OWNED_FILES: [(&str, &str, &str); 4] = [
    ("posts", "video_location", "video_size_bytes"),
    ("properties", "image_location", "image_size_bytes"),
    ("groups", "image_location", "image_size_bytes"),
    ("companies", "logo_location", "logo_size_bytes"),
];

const ACCOUNT_COLUMNS: &str = "id, name, email, bio, password_hash, avatar_location, \
     avatar_size_bytes, email_verified, verification_token, reset_token, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    bio: String,
    password_hash: String,
    avatar_location: String,
    avatar_size_bytes: i64,
    email_verified: bool,
    verification_token: Option<String>,
    reset_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            bio: row.bio,
            avatar: file_ref(row.avatar_location, row.avatar_size_bytes),
            email_verified: row.email_verified,
            password_hash: row.password_hash,
            verification_token: row.verification_token,
            reset_token: row.reset_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for accounts
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccountRepository for PgAccountRepository {
    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "select"))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[tracing::instrument(skip(self, account), fields(db.table = "accounts", db.operation = "insert", email = %account.email))]
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, name, email, bio, password_hash, avatar_location,
                                  avatar_size_bytes, verification_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.bio)
        .bind(&account.password_hash)
        .bind(&account.avatar.location)
        .bind(size_column(&account.avatar))
        .bind(&account.verification_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "An account with this email already exists"))?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "accounts", db.operation = "update"))]
    async fn verify_by_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET email_verified = TRUE, verification_token = NULL, updated_at = NOW()
            WHERE verification_token = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "accounts", db.operation = "update", db.record_id = %id))]
    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE accounts SET reset_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "accounts", db.operation = "select"))]
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE reset_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[tracing::instrument(skip(self, token, password_hash), fields(db.table = "accounts", db.operation = "update"))]
    async fn reset_password(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET password_hash = $2, reset_token = NULL, updated_at = NOW()
            WHERE reset_token = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "accounts", db.operation = "update", db.record_id = %id))]
    async fn update(&self, id: Uuid, update: AccountUpdate) -> Result<Option<Account>, AppError> {
        let avatar_size = update.avatar.as_ref().map(size_column);
        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                password_hash = COALESCE($4, password_hash),
                avatar_location = COALESCE($5, avatar_location),
                avatar_size_bytes = COALESCE($6, avatar_size_bytes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.bio)
        .bind(update.password_hash)
        .bind(update.avatar.map(|a| a.location))
        .bind(avatar_size)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Locking the account row first blocks child inserts (their foreign key
    /// check needs a share lock on it) until the transaction ends, after
    /// which they fail on the missing owner. Every child row removed here is
    /// therefore reported with its file.
    #[tracing::instrument(skip(self), fields(db.table = "accounts", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<DeletedAccount>, AppError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT id FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let mut owned_files: Vec<StoredFileRef> = Vec::new();
        for (table, location, size) in OWNED_FILES {
            let rows = sqlx::query_as::<Postgres, (Option<String>, Option<i64>)>(&format!(
                "DELETE FROM {table} WHERE owner_id = $1 RETURNING {location}, {size}"
            ))
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
            owned_files.extend(
                rows.into_iter()
                    .filter_map(|(location, size)| Some(file_ref(location?, size?))),
            );
        }

        let row = sqlx::query_as::<Postgres, AccountRow>(&format!(
            "DELETE FROM accounts WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(files = owned_files.len(), "Account deleted with owned rows");
        Ok(Some(DeletedAccount {
            account: row.into(),
            owned_files,
        }))
    }
}
