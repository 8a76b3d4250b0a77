//! Health check handler

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Run an async check with timeout; returns "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classifier: String,
    pub storage: String,
}

/// Liveness report. The vision service itself is not probed.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let upload_dir = state.temp_files.base_path().to_path_buf();
    let storage = run_check(
        CHECK_TIMEOUT,
        async move {
            match tokio::fs::metadata(&upload_dir).await {
                Ok(metadata) if metadata.is_dir() => Ok(()),
                Ok(_) => Err(std::io::Error::other("upload path is not a directory")),
                Err(e) => Err(e),
            }
        },
        "unavailable",
    )
    .await;

    let healthy = storage == "healthy";
    if !healthy {
        tracing::error!(storage = %storage, "Upload directory health check failed");
    }

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            classifier: state.classifier.name().to_string(),
            storage,
        }),
    )
}
