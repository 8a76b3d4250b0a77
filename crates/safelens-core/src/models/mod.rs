//! Data models for the application
//!
//! `safe_search` holds the classification returned by the vision service,
//! `upload` the user's form submission.

mod safe_search;
mod upload;

pub use safe_search::*;
pub use upload::*;
