use async_trait::async_trait;
use safelens_core::SafeSearchResult;
use std::fmt::{self, Debug};
use std::path::PathBuf;

use crate::error::VisionError;

/// What the classifier should look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A local file; its bytes are sent inline
    Path(PathBuf),
    /// A publicly reachable image the service fetches itself
    Uri(String),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Uri(uri) => f.write_str(uri),
        }
    }
}

/// Safe-search classification of a single image.
///
/// Implementations must be cheap to share: the application holds one instance
/// behind an `Arc` for its whole lifetime.
#[async_trait]
pub trait SafeSearchClassifier: Send + Sync + Debug {
    /// Classifier name for logs
    fn name(&self) -> &str;

    async fn classify(&self, image: ImageSource) -> Result<SafeSearchResult, VisionError>;
}
