pub mod accounts;
pub mod auth;
pub mod companies;
pub mod groups;
pub mod health;
pub mod posts;
pub mod properties;

use roost_core::Account;
use serde::Serialize;
use utoipa::ToSchema;

/// `{message, status}`
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    pub status: u16,
}

/// `{message, status, user}`
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub message: String,
    pub status: u16,
    pub user: Account,
}

/// `{message, status, token, user}`, returned whenever a credential is issued
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub status: u16,
    pub token: String,
    pub user: Account,
}
