//! Roost API Library
//!
//! HTTP handlers, authentication and application setup. Exposed as a library
//! so the integration tests can build the same router the binary serves.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
