//! Test helpers: build the router against the in-memory store and a
//! temporary media directory.
//!
//! Run from workspace root: `cargo test -p roost-api`.

pub mod auth;
pub mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;
use roost_api::constants;
use roost_api::setup::{routes, services, storage};
use roost_core::Config;
use roost_db::{MemoryStore, Repositories};
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "0123456789abcdef0123456789abcdef";

/// API path prefix for tests (e.g. `/api/v1/posts`).
pub fn api_path(path: &str) -> String {
    constants::api_path(path)
}

/// Test application: server plus the resources it owns.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub media_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of stored files under one destination folder.
    pub fn files_in(&self, folder: &str) -> usize {
        std::fs::read_dir(self.media_dir.path().join(folder))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Images and videos are both capped at 1 MB.
pub async fn setup_test_app() -> TestApp {
    let media_dir = tempfile::tempdir().unwrap();

    let values: HashMap<String, String> = [
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("DATABASE_BACKEND", "memory"),
        ("STORAGE_BACKEND", "local"),
        ("LOCAL_STORAGE_PATH", media_dir.path().to_str().unwrap()),
        ("IMAGE_MAX_SIZE_MB", "1"),
        ("VIDEO_MAX_SIZE_MB", "1"),
        ("IMAGE_UPLOAD_TIMEOUT_SECS", "10"),
        ("VIDEO_UPLOAD_TIMEOUT_SECS", "10"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = Config::from_map(&values).unwrap();

    let storage = storage::setup_storage(&config).await.unwrap();
    let store = Arc::new(MemoryStore::new());
    let state = services::initialize_services(
        &config,
        Repositories::from_memory(store.clone()),
        None,
        storage,
    );
    let router = routes::setup_routes(&config, state).unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        store,
        media_dir,
    }
}
