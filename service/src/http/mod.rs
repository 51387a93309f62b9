//! HTTP application assembly and shared middleware.
//!
//! [`build_app`] wires the keeper routes, the health probe, CORS, request
//! tracing and the security headers into one router. The binary and the
//! integration tests both use it, so tests exercise the same stack that
//! runs in production.

pub mod security;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use security::{build_security_headers, security_headers_middleware};

use crate::config::{CorsConfig, SecurityHeadersConfig};
use crate::keepers::{self, KeeperService};

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Build the CORS layer for the configured origins.
///
/// `"*"` allows any origin; an empty list blocks cross-origin requests.
#[must_use]
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = &config.allowed_origins;
    let allow_origin: AllowOrigin = if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow any origin - not recommended for production");
        AllowOrigin::any()
    } else if origins.is_empty() {
        tracing::info!(
            "CORS allowed origins not configured - cross-origin requests will be blocked"
        );
        AllowOrigin::list(Vec::<HeaderValue>::new())
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        tracing::info!(origins = ?origins, "CORS allowed origins configured");
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(allow_origin)
}

/// Assemble the full application router.
pub fn build_app(
    service: Arc<KeeperService>,
    cors: &CorsConfig,
    security_headers: &SecurityHeadersConfig,
) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(keepers::http::router())
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors));

    if security_headers.enabled {
        tracing::info!("Security headers enabled");
        app = app
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(Extension(build_security_headers(security_headers)));
    } else {
        tracing::info!("Security headers disabled");
    }

    app
}
