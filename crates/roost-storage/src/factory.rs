#[cfg(feature = "storage-cdn")]
use crate::{CdnConfig, CdnStorage};
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use roost_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .unwrap_or_else(|| format!("{}/media", config.public_base_url()));

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-cdn")]
        StorageBackend::Cdn => {
            let missing = |name: &str| StorageError::ConfigError(format!("{} not configured", name));
            let storage = CdnStorage::new(CdnConfig {
                api_base: config.cdn_api_base().to_string(),
                cloud_name: config
                    .cdn_cloud_name()
                    .ok_or_else(|| missing("CDN_CLOUD_NAME"))?
                    .to_string(),
                api_key: config
                    .cdn_api_key()
                    .ok_or_else(|| missing("CDN_API_KEY"))?
                    .to_string(),
                api_secret: config
                    .cdn_api_secret()
                    .ok_or_else(|| missing("CDN_API_SECRET"))?
                    .to_string(),
                folder_prefix: config.cdn_folder_prefix().to_string(),
            })?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-cdn"))]
        StorageBackend::Cdn => Err(StorageError::ConfigError(
            "CDN storage backend not available (storage-cdn feature not enabled)".to_string(),
        )),
    }
}
