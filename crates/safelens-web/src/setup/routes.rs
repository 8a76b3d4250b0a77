//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::get,
    Router,
};
use safelens_infra::{
    get_request_id, request_id_middleware, security_headers_middleware, session_middleware,
    SecurityHeadersConfig,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for the instructions field, the CSRF token and multipart framing
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let config = &state.config;

    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));
    crate::error::configure_error_details(config.is_production());

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = config.server.http_concurrency_limit;
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let body_limit = config
        .upload
        .max_file_size_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    let app = Router::new()
        .route(
            "/",
            get(handlers::upload::upload_form).post(handlers::upload::submit_upload),
        )
        .route(
            "/pdf_results",
            get(handlers::results::pdf_results).post(handlers::results::pdf_results),
        )
        .route("/static/app.css", get(handlers::assets::app_css))
        .route("/health", get(handlers::health::health_check))
        .layer(axum::middleware::from_fn_with_state(
            state.session_settings.clone(),
            session_middleware,
        ))
        // RequestBodyLimitLayer below is the only body limit
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = get_request_id(request).unwrap_or_default();
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}
