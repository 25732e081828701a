//! Media CDN backend speaking the Cloudinary-style upload API.
//!
//! Uploads are signed multipart POSTs to `{api_base}/{cloud}/{resource}/upload`.
//! The provider picks the final public id (`unique_filename=true`) and returns
//! a `secure_url`, which becomes the stored location.

use crate::traits::{Destination, Storage, StorageError, StorageResult, UploadReader};
use crate::StorageBackend;
use async_trait::async_trait;
use roost_core::{MediaClass, StoredFileRef};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio_util::io::ReaderStream;

const VIDEO_TRANSFORMATION: &str = "w_1280,q_auto:good,vc_auto,f_auto";
const IMAGE_TRANSFORMATION: &str = "c_limit,w_1600,q_auto,f_auto";

#[derive(Debug, Clone)]
pub struct CdnConfig {
    pub api_base: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder_prefix: String,
}

#[derive(Clone)]
pub struct CdnStorage {
    client: reqwest::Client,
    config: CdnConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

fn resource_type(class: MediaClass) -> &'static str {
    match class {
        MediaClass::Image => "image",
        MediaClass::Video => "video",
    }
}

fn transformation(class: MediaClass) -> &'static str {
    match class {
        MediaClass::Image => IMAGE_TRANSFORMATION,
        MediaClass::Video => VIDEO_TRANSFORMATION,
    }
}

/// Splits a delivery URL such as
/// `https://res.example.com/demo/video/upload/v17/roost/posts/clip.mp4`
/// into `("video", "roost/posts/clip")`.
pub fn parse_delivery_url(url: &str) -> Option<(String, String)> {
    let path = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();

    let upload_idx = segments.iter().position(|s| *s == "upload")?;
    if upload_idx == 0 {
        return None;
    }
    let resource = segments[upload_idx - 1].to_string();

    let mut rest = &segments[upload_idx + 1..];
    if let Some(first) = rest.first() {
        let is_version =
            first.len() > 1 && first.starts_with('v') && first[1..].chars().all(|c| c.is_ascii_digit());
        if is_version {
            rest = &rest[1..];
        }
    }
    if rest.is_empty() {
        return None;
    }

    let mut public_id = rest.join("/");
    if let Some(dot) = public_id.rfind('.') {
        if dot > public_id.rfind('/').map(|s| s + 1).unwrap_or(0) {
            public_id.truncate(dot);
        }
    }
    Some((resource, public_id))
}

impl CdnStorage {
    pub fn new(config: CdnConfig) -> StorageResult<Self> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(StorageError::ConfigError(
                "CDN cloud name, api key and api secret are required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, resource: &str, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            resource,
            action
        )
    }

    fn folder_for(&self, destination: &Destination) -> String {
        let prefix = self.config.folder_prefix.trim_matches('/');
        let folder = destination.folder.trim_matches('/');
        match (prefix.is_empty(), folder.is_empty()) {
            (true, _) => folder.to_string(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}/{}", prefix, folder),
        }
    }

    /// SHA-256 over the sorted `key=value` pairs joined by `&`, followed by the secret.
    pub fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn provider_error(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => format!("{} ({})", parsed.error.message, status),
            Err(_) => format!("provider returned {}: {}", status, body),
        }
    }
}

#[async_trait]
impl Storage for CdnStorage {
    async fn upload_stream(
        &self,
        destination: &Destination,
        filename: &str,
        content_type: &str,
        content_length: u64,
        reader: UploadReader,
    ) -> StorageResult<StoredFileRef> {
        let start = std::time::Instant::now();
        let resource = resource_type(destination.media_class);
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let params: Vec<(&str, String)> = vec![
            ("folder", self.folder_for(destination)),
            ("timestamp", timestamp),
            ("transformation", transformation(destination.media_class).to_string()),
            ("unique_filename", "true".to_string()),
        ];
        let signature = self.sign(&params);

        let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));
        let file_part = reqwest::multipart::Part::stream_with_length(body, content_length)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;

        let mut form = reqwest::multipart::Form::new().part("file", file_part);
        for (key, value) in params {
            form = form.text(key, value);
        }
        form = form
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint(resource, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("CDN request failed: {}", e)))?;

        if !response.status().is_success() {
            let message = Self::provider_error(response).await;
            tracing::warn!(folder = %destination.folder, error = %message, "CDN upload rejected");
            return Err(StorageError::UploadFailed(message));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid CDN response: {}", e)))?;

        tracing::info!(
            url = %uploaded.secure_url,
            resource_type = resource,
            size_bytes = uploaded.bytes.unwrap_or(content_length),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "CDN upload successful"
        );

        Ok(StoredFileRef::new(
            uploaded.secure_url,
            uploaded.bytes.unwrap_or(content_length),
        ))
    }

    async fn download(&self, location: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(location.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::DownloadFailed(Self::provider_error(response).await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, location: &str) -> StorageResult<()> {
        let (resource, public_id) = parse_delivery_url(location)
            .ok_or_else(|| StorageError::InvalidKey(location.to_string()))?;

        let params: Vec<(&str, String)> = vec![
            ("public_id", public_id.clone()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ];
        let signature = self.sign(&params);

        let mut form: Vec<(&str, String)> = params;
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response = self
            .client
            .post(self.endpoint(&resource, "destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("CDN request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StorageError::DeleteFailed(Self::provider_error(response).await));
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid CDN response: {}", e)))?;

        match destroyed.result.as_str() {
            "ok" => {
                tracing::info!(public_id = %public_id, "CDN delete successful");
                Ok(())
            }
            "not found" => {
                tracing::debug!(public_id = %public_id, "CDN delete: already absent");
                Ok(())
            }
            other => Err(StorageError::DeleteFailed(format!(
                "Unexpected destroy result for {}: {}",
                public_id, other
            ))),
        }
    }

    async fn exists(&self, location: &str) -> StorageResult<bool> {
        let response = self
            .client
            .head(location)
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(response.status().is_success())
    }

    fn public_url(&self, location: &str) -> String {
        location.to_string()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Cdn
    }
}
