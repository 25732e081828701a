//! OpenAPI documentation, served at `/api-docs/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use roost_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roost API",
        version = "0.1.0",
        description = "Accounts, short video posts, rental listings, chat groups and job board companies. Every write that carries a file validates and stores it before the row is committed. All endpoints are versioned under /api/v1/."
    ),
    paths(
        // Auth
        handlers::auth::register,
        handlers::auth::verify_email,
        handlers::auth::login,
        handlers::auth::forgot_password,
        handlers::auth::check_reset_token,
        handlers::auth::reset_password,
        // Accounts
        handlers::accounts::get_me,
        handlers::accounts::update_me,
        handlers::accounts::delete_me,
        // Posts
        handlers::posts::create_post,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        // Properties
        handlers::properties::create_property,
        handlers::properties::list_properties,
        handlers::properties::get_property,
        handlers::properties::update_property,
        handlers::properties::delete_property,
        // Groups
        handlers::groups::create_group,
        handlers::groups::list_groups,
        handlers::groups::get_group,
        handlers::groups::delete_group,
        // Companies
        handlers::companies::register_company,
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::delete_company,
        // Health
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::MessageResponse,
        handlers::AccountResponse,
        handlers::AuthResponse,
        handlers::accounts::ProfileResponse,
        handlers::posts::PostResponse,
        handlers::posts::PostListResponse,
        handlers::properties::PropertyData,
        handlers::properties::PropertyResponse,
        handlers::properties::PropertyListResponse,
        handlers::groups::GroupData,
        handlers::groups::GroupResponse,
        handlers::groups::GroupListResponse,
        handlers::companies::CompanyData,
        handlers::companies::CompanyResponse,
        handlers::companies::CompanyListResponse,
        handlers::health::HealthCheckResponse,
        models::Account,
        models::AccountStatus,
        models::Post,
        models::Property,
        models::Group,
        models::Company,
        models::StoredFileRef,
        models::LoginRequest,
        models::ForgotPasswordRequest,
        models::ResetPasswordRequest,
        models::UpdatePostRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, verification and credentials"),
        (name = "accounts", description = "The authenticated account"),
        (name = "posts", description = "Short video posts"),
        (name = "properties", description = "Rental listings"),
        (name = "groups", description = "Chat groups"),
        (name = "companies", description = "Job board companies"),
        (name = "health", description = "Liveness and dependency checks"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_versioned_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/auth/register"));
        assert!(doc.paths.paths.contains_key("/api/v1/properties/{id}"));
        assert!(doc.paths.paths.contains_key("/api/v1/groups"));
        assert!(doc.paths.paths.contains_key("/api/v1/companies/{id}"));
        assert!(doc.paths.paths.contains_key("/health"));

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
