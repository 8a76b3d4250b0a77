//! Fake classifier recording every call.

use async_trait::async_trait;
use safelens_core::SafeSearchResult;
use safelens_vision::{ImageSource, SafeSearchClassifier, VisionError};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

type Reply = dyn Fn(&[u8]) -> Result<SafeSearchResult, VisionError> + Send + Sync;

/// What the classifier saw on one call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: PathBuf,
    /// Whether the temporary file existed when the classifier was called
    pub existed: bool,
    pub bytes: usize,
}

pub struct RecordingClassifier {
    reply: Box<Reply>,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl std::fmt::Debug for RecordingClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingClassifier")
            .field("calls", &self.call_count())
            .finish()
    }
}

impl RecordingClassifier {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&[u8]) -> Result<SafeSearchResult, VisionError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `result`
    pub fn returning(result: SafeSearchResult) -> Self {
        Self::new(move |_| Ok(result))
    }

    /// Always fail with a 503 from the vision service
    pub fn unavailable() -> Self {
        Self::new(|_| {
            Err(VisionError::Http {
                status: 503,
                body: "backend unavailable".to_string(),
            })
        })
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SafeSearchClassifier for RecordingClassifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn classify(&self, image: ImageSource) -> Result<SafeSearchResult, VisionError> {
        let path = match image {
            ImageSource::Path(path) => path,
            ImageSource::Uri(uri) => panic!("unexpected URI image source: {}", uri),
        };

        let data = tokio::fs::read(&path).await;
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.clone(),
            existed: data.is_ok(),
            bytes: data.as_ref().map(Vec::len).unwrap_or_default(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let data = data.map_err(|e| VisionError::ImageRead(e.to_string()))?;
        (self.reply)(&data)
    }
}
