//! SafeLens Infrastructure Library
//!
//! Shared HTTP plumbing for the SafeLens web service:
//! - Middleware (request ID, security headers, signed session cookie)
//! - CSRF tokens bound to the session
//! - Tracing initialization

pub mod csrf;
pub mod middleware;
pub mod signing;
pub mod telemetry;

// Re-export commonly used types
pub use csrf::{generate_csrf_token, verify_csrf_token};
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, session_middleware,
    RequestId, SecurityHeadersConfig, SessionId, SessionSettings, SESSION_COOKIE_NAME,
};
pub use signing::Signer;
pub use telemetry::{init_telemetry, shutdown_telemetry};
