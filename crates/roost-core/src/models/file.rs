use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Broad category of an uploaded file; selects size limits and accepted types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Image,
    Video,
}

impl MediaClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaClass::Image => "image",
            MediaClass::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted file as recorded on the entity that owns it.
///
/// `location` is a path relative to the local storage root, or the absolute
/// secure URL returned by the CDN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct StoredFileRef {
    #[schema(example = "properties/house_1730000000000000001.png")]
    pub location: String,
    pub size_bytes: u64,
}

impl StoredFileRef {
    pub fn new(location: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            location: location.into(),
            size_bytes,
        }
    }
}
