//! Application state shared by every handler.

use std::sync::Arc;

use roost_core::Config;
use roost_services::{MediaPolicies, Services};
use roost_storage::Storage;
use sqlx::PgPool;

use crate::auth::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub services: Services,
    pub storage: Arc<dyn Storage>,
    pub policies: MediaPolicies,
    pub jwt: Arc<JwtService>,
    /// `None` when accounts and listings live in memory
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Largest body a handler will spool for one file of either class.
    pub fn max_upload_bytes(&self) -> u64 {
        self.policies
            .image
            .max_file_size()
            .max(self.policies.video.max_file_size())
    }
}
