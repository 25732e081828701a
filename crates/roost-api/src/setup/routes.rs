//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::auth_middleware;
use crate::constants::{
    API_PREFIX, HTTP_CONCURRENCY_LIMIT, MULTIPART_OVERHEAD_BYTES, OPENAPI_PATH,
};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use roost_core::{Config, StorageBackend};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        state.jwt.clone(),
        auth_middleware,
    ));

    let api_routes = public_routes().merge(protected_routes);

    let body_limit = state.max_upload_bytes() as usize + MULTIPART_OVERHEAD_BYTES;
    tracing::info!(body_limit_bytes = body_limit, "Request body limit configured");

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
        .merge(RapiDoc::new(OPENAPI_PATH).path("/docs"))
        .nest(API_PREFIX, api_routes);

    if config.storage_backend() == StorageBackend::Local {
        if let Some(path) = config.local_storage_path() {
            app = app.nest_service("/media", ServeDir::new(path));
        }
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<Arc<AppState>> {
    use axum::routing::post;
    use handlers::{auth, companies, properties};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/verify/{token}", get(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route(
            "/auth/reset-password/{token}",
            get(auth::check_reset_token).post(auth::reset_password),
        )
        .route("/properties", get(properties::list_properties))
        .route("/properties/{id}", get(properties::get_property))
        .route("/companies", get(companies::list_companies))
        .route("/companies/{id}", get(companies::get_company))
}

fn protected_routes() -> Router<Arc<AppState>> {
    use axum::routing::{delete, post, put};
    use handlers::{accounts, companies, groups, posts, properties};

    Router::new()
        .route(
            "/accounts/me",
            get(accounts::get_me)
                .put(accounts::update_me)
                .delete(accounts::delete_me),
        )
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/properties", post(properties::create_property))
        .route(
            "/properties/{id}",
            put(properties::update_property).delete(properties::delete_property),
        )
        .route("/groups", post(groups::create_group).get(groups::list_groups))
        .route("/groups/{id}", get(groups::get_group).delete(groups::delete_group))
        .route("/companies", post(companies::register_company))
        .route("/companies/{id}", delete(companies::delete_company))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
