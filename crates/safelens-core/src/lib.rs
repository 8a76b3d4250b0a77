//! SafeLens Core Library
//!
//! This crate provides the domain models, error types, configuration, upload
//! validation and the submission state machine shared by the SafeLens crates.

pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, ServerConfig, SessionConfig, UploadConfig, VisionConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use flow::{FlowError, FlowEvent, FlowState, UploadFlow};
pub use models::{
    AnalysisRecord, Likelihood, SafeSearchCategory, SafeSearchResult,
    UploadSubmission, DEFAULT_INSTRUCTIONS,
};
pub use validation::{sanitize_filename, UploadValidationError, UploadValidator};
