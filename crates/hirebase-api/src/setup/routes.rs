//! Route configuration and setup

use crate::api_doc;
use crate::constants::{
    API_PREFIX, HTTP_CONCURRENCY_LIMIT, MAX_REQUEST_BODY_BYTES, OPENAPI_PATH,
};
use crate::handlers;
use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;
use crate::tenancy::tenant_middleware;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use hirebase_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/health", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check))
        .route(OPENAPI_PATH, get(openapi_json))
        .nest(API_PREFIX, api_routes())
        // Tenant resolution runs for every route above; public paths pass straight through
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            tenant_middleware,
        ))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_PATH).path("/docs"))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Onboarding
        .route("/auth/register", post(handlers::registration::register))
        .route(
            "/companies/register",
            post(handlers::registration::register_company),
        )
        // Auth
        .route("/auth/login", post(handlers::auth::login))
        // Tenant
        .route("/tenant", get(handlers::tenant::get_tenant))
        .route("/me", get(handlers::tenant::get_me))
        .route(
            "/admin/tenants/{id}/suspend",
            post(handlers::tenant::suspend_tenant),
        )
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api_doc::get_openapi_spec())
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins().contains(&"*".to_string()) {
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
