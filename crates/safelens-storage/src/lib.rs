//! SafeLens Storage Library
//!
//! Transient storage for uploaded images. Every upload is written to its own
//! randomly named file inside the configured upload directory and removed once
//! the classifier has answered.
//!
//! # File naming
//!
//! Files are named `{uuid-v4}.jpg`. The user-supplied filename never reaches
//! the filesystem, so two concurrent uploads of `cat.jpg` cannot collide.

pub mod error;
pub mod temp;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use temp::{TempFileStore, TemporaryFile};
