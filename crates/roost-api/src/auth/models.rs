use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use roost_core::{AppError, Identity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HttpAppError;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // account id
    pub email: String,
    pub name: String,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl From<JwtClaims> for Identity {
    fn from(claims: JwtClaims) -> Self {
        Identity {
            subject_id: claims.sub,
            display_name: claims.name,
            email: claims.email,
            verified: claims.verified,
            avatar: claims.avatar,
        }
    }
}

/// Caller identity placed in request extensions by [`auth_middleware`](super::auth_middleware).
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

// Extension cannot be used with Multipart, so we extract directly from request parts
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized("Authentication required".to_string()))
                    .into_response()
            })
    }
}
