//! Roost persistence
//!
//! Repository traits for accounts, posts, properties, groups and companies,
//! with a Postgres
//! implementation (`sqlx`) and an in-memory one used by tests and
//! `DATABASE_BACKEND=memory`.

pub mod memory;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use sqlx::PgPool;

pub use memory::MemoryStore;
pub use postgres::{
    PgAccountRepository, PgCompanyRepository, PgGroupRepository, PgPostRepository,
    PgPropertyRepository,
};
pub use repository::{
    AccountRepository, CompanyRepository, GroupRepository, PostRepository, PropertyRepository,
};

/// One handle per entity, built once at startup and shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub companies: Arc<dyn CompanyRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            properties: Arc::new(PgPropertyRepository::new(pool.clone())),
            groups: Arc::new(PgGroupRepository::new(pool.clone())),
            companies: Arc::new(PgCompanyRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Every trait backed by the same store, so cascades stay consistent.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            accounts: store.clone(),
            posts: store.clone(),
            properties: store.clone(),
            groups: store.clone(),
            companies: store,
        }
    }
}
