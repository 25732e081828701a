use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use roost_core::AppError;

use super::JwtService;
use crate::error::HttpAppError;

/// Require a valid `Authorization: Bearer <token>` header and attach the
/// decoded [`Identity`](roost_core::Identity) to the request.
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match jwt.verify(token.trim()) {
        Ok(identity) => {
            tracing::debug!(account_id = %identity.subject_id, "Authenticated request");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}
