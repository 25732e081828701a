//! Configuration module
//!
//! Server, database, storage, upload-policy, authentication and email settings,
//! read from the environment (after loading `.env`) with defaults for everything
//! that has a sensible one.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const IMAGE_MAX_SIZE_MB: u64 = 10;
const VIDEO_MAX_SIZE_MB: u64 = 100;
const IMAGE_UPLOAD_TIMEOUT_SECS: u64 = 60;
const VIDEO_UPLOAD_TIMEOUT_SECS: u64 = 300;
const IMAGE_EXTENSIONS: &str = "jpg,jpeg,png,gif,webp";
const IMAGE_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp";
const VIDEO_EXTENSIONS: &str = "mp4,mov,avi,wmv,flv,webm,mkv";
const VIDEO_CONTENT_TYPES: &str = "video/mp4,video/quicktime,video/x-msvideo,video/x-ms-wmv,\
video/x-flv,video/webm,video/x-matroska";

/// Where rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

/// Size, type and time limits for one media class.
#[derive(Clone, Debug)]
pub struct MediaLimits {
    pub max_size_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub accepted_content_types: Vec<String>,
    pub upload_timeout: Duration,
}

/// Settings shared by every process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_backend: DatabaseBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

/// Full application configuration
#[derive(Clone, Debug)]
pub struct RoostConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub cdn_api_base: String,
    pub cdn_cloud_name: Option<String>,
    pub cdn_api_key: Option<String>,
    pub cdn_api_secret: Option<String>,
    pub cdn_folder_prefix: String,
    // Upload policies
    pub image: MediaLimits,
    pub video: MediaLimits,
    // Email notifications
    pub email_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub public_base_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<RoostConfig>);

impl Config {
    fn inner(&self) -> &RoostConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an explicit key/value map instead of the process environment.
    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = RoostConfig::from_lookup(&lookup)?;
        config.validate()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn database_backend(&self) -> DatabaseBackend {
        self.inner().base.database_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().base.database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().base.jwt_expiry_hours
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn cdn_api_base(&self) -> &str {
        &self.inner().cdn_api_base
    }

    pub fn cdn_cloud_name(&self) -> Option<&str> {
        self.inner().cdn_cloud_name.as_deref()
    }

    pub fn cdn_api_key(&self) -> Option<&str> {
        self.inner().cdn_api_key.as_deref()
    }

    pub fn cdn_api_secret(&self) -> Option<&str> {
        self.inner().cdn_api_secret.as_deref()
    }

    pub fn cdn_folder_prefix(&self) -> &str {
        &self.inner().cdn_folder_prefix
    }

    pub fn image_limits(&self) -> &MediaLimits {
        &self.inner().image
    }

    pub fn video_limits(&self) -> &MediaLimits {
        &self.inner().video
    }

    pub fn email_enabled(&self) -> bool {
        self.inner().email_enabled
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.inner().smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.inner().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().public_base_url
    }
}

fn list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl RoostConfig {
    fn from_lookup<F>(var: &F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => PORT,
        };

        let database_backend = var("DATABASE_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(DatabaseBackend::Postgres);

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            database_backend,
            database_url: non_empty(var("DATABASE_URL")),
            db_max_connections: parse_or(var("DB_MAX_CONNECTIONS"), MAX_CONNECTIONS),
            db_timeout_seconds: parse_or(var("DB_TIMEOUT_SECONDS"), CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: parse_or(var("JWT_EXPIRY_HOURS"), JWT_EXPIRY_HOURS),
        };

        let storage_backend = var("STORAGE_BACKEND")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StorageBackend::Local);

        let image = MediaLimits {
            max_size_bytes: parse_or(var("IMAGE_MAX_SIZE_MB"), IMAGE_MAX_SIZE_MB) * 1024 * 1024,
            allowed_extensions: list(
                var("IMAGE_ALLOWED_EXTENSIONS").unwrap_or_else(|| IMAGE_EXTENSIONS.to_string()),
            ),
            accepted_content_types: list(
                var("IMAGE_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| IMAGE_CONTENT_TYPES.to_string()),
            ),
            upload_timeout: Duration::from_secs(parse_or(
                var("IMAGE_UPLOAD_TIMEOUT_SECS"),
                IMAGE_UPLOAD_TIMEOUT_SECS,
            )),
        };

        let video = MediaLimits {
            max_size_bytes: parse_or(var("VIDEO_MAX_SIZE_MB"), VIDEO_MAX_SIZE_MB) * 1024 * 1024,
            allowed_extensions: list(
                var("VIDEO_ALLOWED_EXTENSIONS").unwrap_or_else(|| VIDEO_EXTENSIONS.to_string()),
            ),
            accepted_content_types: list(
                var("VIDEO_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| VIDEO_CONTENT_TYPES.to_string()),
            ),
            upload_timeout: Duration::from_secs(parse_or(
                var("VIDEO_UPLOAD_TIMEOUT_SECS"),
                VIDEO_UPLOAD_TIMEOUT_SECS,
            )),
        };

        Ok(RoostConfig {
            base,
            storage_backend,
            local_storage_path: non_empty(var("LOCAL_STORAGE_PATH")),
            local_storage_base_url: non_empty(var("LOCAL_STORAGE_BASE_URL")),
            cdn_api_base: var("CDN_API_BASE")
                .unwrap_or_else(|| "https://api.cloudinary.com/v1_1".to_string()),
            cdn_cloud_name: non_empty(var("CDN_CLOUD_NAME")),
            cdn_api_key: non_empty(var("CDN_API_KEY")),
            cdn_api_secret: non_empty(var("CDN_API_SECRET")),
            cdn_folder_prefix: var("CDN_FOLDER_PREFIX").unwrap_or_else(|| "roost".to_string()),
            image,
            video,
            email_enabled: parse_or(var("EMAIL_ENABLED").map(|s| s.to_lowercase()), false),
            smtp_host: non_empty(var("SMTP_HOST")),
            smtp_port: var("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .filter(|&p| p > 0),
            smtp_user: non_empty(var("SMTP_USER")),
            smtp_password: non_empty(var("SMTP_PASSWORD")),
            smtp_from: non_empty(var("SMTP_FROM")),
            smtp_tls: parse_or(var("SMTP_TLS").map(|s| s.to_lowercase()), true),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", server_port)),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let env = self.base.environment.to_lowercase();
        let is_production = env == "production" || env == "prod";
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if self.base.database_backend == DatabaseBackend::Postgres {
            match self.base.database_url.as_deref() {
                Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {}
                _ => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
            }
        }

        if self.email_enabled && (self.smtp_host.is_none() || self.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "EMAIL_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        match self.storage_backend {
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Cdn => {
                if self.cdn_cloud_name.is_none()
                    || self.cdn_api_key.is_none()
                    || self.cdn_api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CDN_CLOUD_NAME, CDN_API_KEY and CDN_API_SECRET must be set when using the cdn storage backend"
                    ));
                }
            }
        }

        for (class, limits) in [("IMAGE", &self.image), ("VIDEO", &self.video)] {
            if limits.max_size_bytes == 0 {
                return Err(anyhow::anyhow!("{}_MAX_SIZE_MB must be greater than 0", class));
            }
            if limits.upload_timeout.is_zero() {
                return Err(anyhow::anyhow!(
                    "{}_UPLOAD_TIMEOUT_SECS must be greater than 0",
                    class
                ));
            }
        }

        Ok(())
    }
}
