use axum::{http::header, response::IntoResponse};

use crate::templates::APP_CSS;

/// Stylesheet compiled into the binary
pub async fn app_css() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        APP_CSS,
    )
}
