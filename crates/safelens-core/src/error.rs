//! Error types module
//!
//! All request-level failures are unified under [`AppError`]. Each variant
//! describes its own presentation through [`ErrorMetadata`]; the web crate turns
//! that into a rendered page or a redirect. Every kind is terminal to the
//! current request only.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unavailable upstream
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return when the error is rendered as a page
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether resubmitting the same form may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action shown under the message
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the user
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External service error: {message}")]
    ExternalService { message: String, transient: bool },

    #[error("No result available for this session")]
    NoResult,

    #[error("CSRF token rejected")]
    CsrfRejected,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Select a JPG file and submit the form again"),
            false,
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::ExternalService { transient, .. } => (
            502,
            "EXTERNAL_SERVICE_ERROR",
            *transient,
            Some("Submit the image again in a moment"),
            true,
            LogLevel::Warn,
        ),
        AppError::NoResult => (
            404,
            "NO_RESULT",
            false,
            Some("Upload an image to see its classification"),
            false,
            LogLevel::Debug,
        ),
        AppError::CsrfRejected => (
            403,
            "CSRF_REJECTED",
            true,
            Some("Reload the upload form and submit again"),
            false,
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for logs
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Storage(_) => "StorageError",
            AppError::ExternalService { .. } => "ExternalServiceError",
            AppError::NoResult => "NoResultError",
            AppError::CsrfRejected => "CsrfRejected",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Storage(_) => "The upload could not be stored".to_string(),
            AppError::ExternalService { .. } => {
                "The image analysis service is unavailable right now".to_string()
            }
            AppError::NoResult => "There is no analysis to show yet".to_string(),
            AppError::CsrfRejected => "Your form session has expired".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_storage() {
        let err = AppError::Storage("disk full".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "The upload could not be stored");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_external_service() {
        let transient = AppError::ExternalService {
            message: "timed out".to_string(),
            transient: true,
        };
        assert_eq!(transient.http_status_code(), 502);
        assert!(transient.is_recoverable());
        assert!(!transient.client_message().contains("timed out"));

        let permanent = AppError::ExternalService {
            message: "API key invalid".to_string(),
            transient: false,
        };
        assert!(!permanent.is_recoverable());
        assert_eq!(permanent.error_type(), "ExternalServiceError");
    }

    #[test]
    fn test_error_metadata_validation() {
        let err = AppError::Validation("Please select a JPG.".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Please select a JPG.");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let err: AppError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, AppError::Storage(msg) if msg.contains("denied")));
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("root cause").context("outer context");
        let err = AppError::from(source);
        let details = err.detailed_message();
        assert!(details.contains("Caused by"));
        assert!(details.contains("root cause"));
    }
}
