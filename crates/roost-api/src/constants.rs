//! API constants

/// Prefix under which every versioned route is mounted.
pub const API_PREFIX: &str = "/api/v1";

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Room left in a request body for form fields and multipart framing on top
/// of the largest accepted file.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Requests served at once before new ones queue.
pub const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Build a versioned API path: `api_path("/posts")` is `/api/v1/posts`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}
