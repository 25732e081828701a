use std::path::Path;
use std::time::Duration;

use roost_core::config::MediaLimits;
use roost_core::{AppError, MediaClass, UploadFailure};

use crate::upload::UploadRequest;

/// Bytes read from the start of a file for magic-number detection.
pub const SNIFF_LEN: usize = 512;

/// Why a file was refused before reaching storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    Oversize { size: u64, max: u64 },

    #[error("Invalid file extension: {extension} (allowed: {})", .allowed.join(", "))]
    BadExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File content is not a valid {class} (detected: {detected})")]
    BadSniffedType { detected: String, class: MediaClass },

    #[error("Could not read uploaded file: {0}")]
    Unreadable(String),
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unreadable(msg) => AppError::Internal(msg),
            other => AppError::Upload(UploadFailure::Rejected(other.to_string())),
        }
    }
}

/// Media file validator for one media class
///
/// Checks run cheapest first: declared size, then extension, then the type
/// detected from the file's leading bytes. The client's content-type header
/// never decides anything.
#[derive(Debug, Clone)]
pub struct FileValidator {
    class: MediaClass,
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    accepted_types: Vec<String>,
    timeout: Duration,
}

impl FileValidator {
    pub fn new(
        class: MediaClass,
        max_file_size: u64,
        allowed_extensions: Vec<String>,
        accepted_types: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            class,
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            accepted_types: accepted_types.into_iter().map(|t| t.to_lowercase()).collect(),
            timeout,
        }
    }

    pub fn from_limits(class: MediaClass, limits: &MediaLimits) -> Self {
        Self::new(
            class,
            limits.max_size_bytes,
            limits.allowed_extensions.clone(),
            limits.accepted_content_types.clone(),
            limits.upload_timeout,
        )
    }

    pub fn class(&self) -> MediaClass {
        self.class
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// How long a caller waits for a file of this class to be stored
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn validate_file_size(&self, size: u64) -> Result<(), Rejection> {
        if size == 0 {
            return Err(Rejection::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(Rejection::Oversize {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_extension(&self, filename: &str) -> Result<String, Rejection> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_extensions.contains(&extension) {
            return Err(Rejection::BadExtension {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    extension
                },
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Detect the real type from leading bytes and require it to be an
    /// accepted type of this validator's class.
    pub fn validate_sniffed(&self, prefix: &[u8]) -> Result<&'static str, Rejection> {
        let detected = infer::get(prefix).map(|kind| kind.mime_type());

        match detected {
            Some(mime)
                if mime.starts_with(self.class.as_str())
                    && self.accepted_types.iter().any(|t| t == mime) =>
            {
                Ok(mime)
            }
            other => Err(Rejection::BadSniffedType {
                detected: other.unwrap_or("unknown").to_string(),
                class: self.class,
            }),
        }
    }

    /// Run every check against a spooled request. The source is left rewound.
    ///
    /// Returns the detected MIME type on success.
    pub async fn validate(&self, request: &mut UploadRequest) -> Result<&'static str, Rejection> {
        self.validate_file_size(request.declared_size)?;
        self.validate_extension(&request.declared_filename)?;

        let prefix = request
            .source
            .read_prefix(SNIFF_LEN)
            .await
            .map_err(|e| Rejection::Unreadable(e.to_string()))?;

        let mime = self.validate_sniffed(&prefix)?;

        if !request
            .declared_content_type
            .eq_ignore_ascii_case(mime)
        {
            tracing::debug!(
                declared = %request.declared_content_type,
                detected = mime,
                filename = %request.declared_filename,
                "Declared content type differs from detected type"
            );
        }

        Ok(mime)
    }
}
