//! SafeLens Web Library
//!
//! The HTTP surface: upload form, submission handling, results page, plus the
//! application state and setup used by the binary and the integration tests.

mod handlers;
mod utils;

pub mod error;
pub mod session_store;
pub mod setup;
pub mod state;
pub mod templates;

// Re-exports
pub use error::HttpAppError;
pub use state::AppState;
