//! Service wiring

use std::sync::Arc;

use roost_core::Config;
use roost_db::Repositories;
use roost_services::{create_notifier, MediaPolicies, Services};
use roost_storage::Storage;
use sqlx::PgPool;

use crate::auth::JwtService;
use crate::state::AppState;

pub fn initialize_services(
    config: &Config,
    repositories: Repositories,
    pool: Option<PgPool>,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let policies = MediaPolicies::from_config(config);
    let notifier = create_notifier(config);
    let services = Services::new(repositories, storage.clone(), policies.clone(), notifier);
    let jwt = Arc::new(JwtService::new(
        config.jwt_secret(),
        config.jwt_expiry_hours(),
    ));

    tracing::info!(
        image_max_bytes = policies.image.max_file_size(),
        video_max_bytes = policies.video.max_file_size(),
        "Services initialized"
    );

    Arc::new(AppState {
        config: config.clone(),
        services,
        storage,
        policies,
        jwt,
        pool,
    })
}
