//! Multipart form parsing for the create and update handlers.
//!
//! Text parts are collected by name. The one file part a handler expects is
//! spooled to a temporary file chunk by chunk and never buffered whole.

use std::collections::HashMap;

use axum::extract::Multipart;
use roost_core::AppError;
use roost_processing::{UploadRequest, UploadSource};

use crate::error::HttpAppError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<UploadRequest>,
}

impl MultipartForm {
    /// Read every part. Only a part named `file_field` is treated as the file;
    /// at most `cap` bytes of it are written, although all bytes are counted.
    pub async fn read(
        mut multipart: Multipart,
        file_field: &str,
        cap: u64,
    ) -> Result<Self, HttpAppError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string).unwrap_or_default();

            if name != file_field {
                let value = field.text().await?;
                form.fields.insert(name, value);
                continue;
            }

            if form.file.is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Multiple '{}' file fields are not allowed",
                    file_field
                ))
                .into());
            }

            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();

            let mut source = UploadSource::spooled().await.map_err(AppError::from)?;
            while let Some(chunk) = field.chunk().await? {
                source.push_chunk(&chunk, cap).await.map_err(AppError::from)?;
            }
            source.finish().await.map_err(AppError::from)?;

            // An untouched file input arrives as a nameless empty part
            if filename.is_empty() && source.observed() == 0 {
                continue;
            }

            tracing::debug!(
                field = %file_field,
                filename = %filename,
                size_bytes = source.observed(),
                "Spooled file part"
            );
            form.file = Some(UploadRequest::new(source, filename, content_type));
        }

        Ok(form)
    }

    pub fn take_file(&mut self) -> Option<UploadRequest> {
        self.file.take()
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Missing text becomes empty, left for field validation to report.
    pub fn text_or_default(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    pub fn int(&self, name: &str) -> Result<Option<i32>, AppError> {
        match self.fields.get(name).map(|v| v.trim()) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i32>()
                .map(Some)
                .map_err(|_| AppError::field(name, format!("{} must be a whole number", name))),
        }
    }

    pub fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        match self.fields.get(name).map(|v| v.trim().to_ascii_lowercase()) {
            None => Ok(None),
            Some(raw) => match raw.as_str() {
                "" => Ok(None),
                "true" | "1" | "on" | "yes" => Ok(Some(true)),
                "false" | "0" | "off" | "no" => Ok(Some(false)),
                _ => Err(AppError::field(name, format!("{} must be true or false", name))),
            },
        }
    }
}
