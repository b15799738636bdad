//! REST API Routes Module
//!
//! Route handlers organized by resource, plus the assembly of the complete
//! router with its middleware stack.

pub mod agent;
pub mod console;
pub mod health;
pub mod log;

use std::any::Any as PanicPayload;
use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::constants::ROOT_STATUS_TEXT;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{rate_limit_middleware, RateLimitState};
use crate::state::AppState;
use crate::telemetry::observability_middleware;

pub use agent::create_router as agent_router;
pub use console::create_router as console_router;
pub use health::create_router as health_router;
pub use log::create_router as log_router;

// ============================================================================
// SHARED HANDLERS
// ============================================================================

/// GET / - Plain-text liveness banner
async fn root() -> &'static str {
    ROOT_STATUS_TEXT
}

/// Fallback for any unmatched method and path.
pub(crate) async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

/// Turn a handler panic into the generic internal error body.
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");
    ApiError::internal_error("Internal server error").into_response()
}

// ============================================================================
// ROUTER ASSEMBLY
// ============================================================================

/// Create the complete API router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS (outermost) - handles preflight requests
/// 2. Observability - request span and completion log
/// 3. Rate Limiting - per client address
/// 4. Panic catching (innermost) - converts handler panics to 500
pub fn create_api_router(state: AppState, api_config: &ApiConfig) -> ApiResult<Router> {
    let api_routes = Router::new()
        .nest("/agents", agent::create_router(state.clone()))
        .nest("/logs", log::create_router(state.clone()))
        .nest("/console", console::create_router(state.clone()));

    #[cfg_attr(not(feature = "openapi"), allow(unused_mut))]
    let mut router = Router::new()
        .route("/", get(root).fallback(route_not_found))
        .nest("/api", api_routes)
        .nest("/health", health::create_router(state));

    #[cfg(feature = "openapi")]
    {
        router = router.route(
            "/openapi.json",
            get(openapi_json).fallback(route_not_found),
        );
    }

    let rate_limit_state = RateLimitState::new(api_config.clone());
    let cors = build_cors_layer(api_config);

    // Execution order: CORS -> Observability -> Rate Limiting -> Panic catch -> Handler
    Ok(router
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(rate_limit_state, rate_limit_middleware))
        .layer(from_fn(observability_middleware))
        .layer(cors))
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// An empty origin list allows all origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("retry-after"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
