//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that
//! converts into [`AppError`] can be propagated with `?` and ends up as either
//! a redirect (no result yet) or the rendered error page.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use safelens_core::{AppError, ErrorMetadata, FlowError, LogLevel};
use safelens_storage::StorageError;
use safelens_vision::VisionError;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::templates::{ErrorView, TemplateError, Templates, ERROR_TEMPLATE};

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from safelens-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::Storage(err.to_string()))
    }
}

impl From<VisionError> for HttpAppError {
    fn from(err: VisionError) -> Self {
        HttpAppError(AppError::ExternalService {
            transient: err.is_transient(),
            message: err.to_string(),
        })
    }
}

impl From<TemplateError> for HttpAppError {
    fn from(err: TemplateError) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

impl From<FlowError> for HttpAppError {
    fn from(err: FlowError) -> Self {
        HttpAppError(AppError::Internal(err.to_string()))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                "Error occurred"
            );
        }
    }
}

/// Details stay hidden until the router is built from a non-production config
static HIDE_ERROR_DETAILS: AtomicBool = AtomicBool::new(true);

/// Set from [`Config::is_production`](safelens_core::Config::is_production)
/// when the routes are built.
pub fn configure_error_details(production: bool) {
    HIDE_ERROR_DETAILS.store(production, Ordering::Relaxed);
}

/// Always hide details in production; elsewhere only for non-sensitive errors.
fn error_details(error: &AppError, production: bool) -> Option<String> {
    if production || error.is_sensitive() {
        None
    } else {
        Some(error.detailed_message())
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        log_error(app_error);

        // Nothing to show yet: send the user back to the form
        if matches!(app_error, AppError::NoResult) {
            return Redirect::to("/").into_response();
        }

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let details = error_details(app_error, HIDE_ERROR_DETAILS.load(Ordering::Relaxed));

        let view = ErrorView {
            status: status.as_u16(),
            message: app_error.client_message(),
            suggested_action: app_error.suggested_action().map(String::from),
            details,
        };

        match Templates::global().and_then(|templates| templates.render(ERROR_TEMPLATE, &view)) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to render error page");
                (
                    status,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    view.message,
                )
                    .into_response()
            }
        }
    }
}
