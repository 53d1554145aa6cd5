use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::{get, patch, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use mediaconv_core::config::CorsConfig;

use super::files::FILENAME_HEADER;
use super::middleware::metrics_middleware;
use super::{files, handlers};
use crate::state::AppState;

type AppRouter = Router<Arc<AppState>>;

/// Register `path` both with and without a trailing slash.
fn route_both(
    router: AppRouter,
    path: &str,
    method_router: MethodRouter<Arc<AppState>>,
) -> AppRouter {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

/// CORS for the browser frontend. Only the configured origin may call the
/// API, with credentials; no origin is allowed when none is configured.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([header::CONTENT_DISPOSITION, header::CONTENT_TYPE, FILENAME_HEADER]);

    let Some(origin) = config.allowed_origin() else {
        return layer;
    };

    match HeaderValue::from_str(&origin) {
        // A list only echoes the origin back to callers that sent it
        Ok(origin) => layer
            .allow_origin(AllowOrigin::list([origin]))
            .allow_credentials(true),
        Err(_) => {
            warn!(origin = %origin, "Ignoring CORS origin that is not a valid header value");
            layer
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config().upload.max_body_bytes;
    let cors = cors_layer(&state.config().cors);

    let routes = [
        // Health and metrics
        ("/health", get(handlers::health)),
        ("/metrics", get(handlers::metrics)),
        // Format registry
        ("/supported-formats", get(handlers::supported_formats)),
        ("/supported-conversions", get(handlers::supported_conversions)),
        ("/is-valid-conversion", get(handlers::is_valid_conversion)),
        // Session files
        ("/upload", post(files::upload)),
        ("/convert", patch(files::convert)),
        ("/download", get(files::download)),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            route_both(router, path, method_router)
        })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
