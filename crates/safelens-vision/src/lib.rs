//! SafeLens Vision Library
//!
//! The boundary to the image classifier. Handlers only see the
//! [`SafeSearchClassifier`] trait; production wires a [`GoogleVisionClient`]
//! wrapped in a [`RetryingClassifier`], tests substitute a fake.

pub mod classifier;
pub mod error;
pub mod google;
pub mod retry;

// Re-export commonly used types
pub use classifier::{ImageSource, SafeSearchClassifier};
pub use error::VisionError;
pub use google::GoogleVisionClient;
pub use retry::{RetryPolicy, RetryingClassifier};
