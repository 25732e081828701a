//! Postgres repositories
//!
//! Rows are read into private `FromRow` structs and converted into the core
//! models, which embed the file reference as a single `StoredFileRef`.

mod account;
mod company;
mod group;
mod post;
mod property;

pub use account::PgAccountRepository;
pub use company::PgCompanyRepository;
pub use group::PgGroupRepository;
pub use post::PgPostRepository;
pub use property::PgPropertyRepository;

use roost_core::{AppError, StoredFileRef};

/// Turn a unique-index violation into a client-facing conflict.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => missing_owner(err),
    }
}

/// An `owner_id` foreign key violation means the owning account is gone.
pub(crate) fn missing_owner(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound("Owner account not found".to_string())
        }
        _ => AppError::Database(err),
    }
}

pub(crate) fn file_ref(location: String, size_bytes: i64) -> StoredFileRef {
    StoredFileRef::new(location, u64::try_from(size_bytes).unwrap_or_default())
}

pub(crate) fn size_column(file: &StoredFileRef) -> i64 {
    i64::try_from(file.size_bytes).unwrap_or(i64::MAX)
}
