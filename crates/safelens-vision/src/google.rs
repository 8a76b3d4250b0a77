//! Google Cloud Vision safe-search client

use async_trait::async_trait;
use base64::Engine;
use safelens_core::{Likelihood, SafeSearchResult, VisionConfig};
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::classifier::{ImageSource, SafeSearchClassifier};
use crate::error::VisionError;

const SAFE_SEARCH_FEATURE: &str = "SAFE_SEARCH_DETECTION";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_LEN: usize = 512;

/// Calls `POST {endpoint}/images:annotate?key=...` with the safe-search feature.
pub struct GoogleVisionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl Debug for GoogleVisionClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GoogleVisionClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GoogleVisionClient {
    pub fn new(config: &VisionConfig) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .build()
            .map_err(|e| {
                VisionError::Config(format!(
                    "Failed to create HTTP client for Google Vision API: {}",
                    e
                ))
            })?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    fn annotate_url(&self) -> String {
        format!("{}/images:annotate", self.endpoint)
    }

    async fn image_payload(image: &ImageSource) -> Result<serde_json::Value, VisionError> {
        match image {
            ImageSource::Path(path) => {
                let data = tokio::fs::read(path).await.map_err(|e| {
                    VisionError::ImageRead(format!("{}: {}", path.display(), e))
                })?;
                let content = base64::engine::general_purpose::STANDARD.encode(&data);
                Ok(json!({ "content": content }))
            }
            ImageSource::Uri(uri) => Ok(json!({ "source": { "imageUri": uri } })),
        }
    }

    async fn annotate(&self, image: &ImageSource) -> Result<VisionResponse, VisionError> {
        let request_body = json!({
            "requests": [{
                "image": Self::image_payload(image).await?,
                "features": [{ "type": SAFE_SEARCH_FEATURE }]
            }]
        });

        let response = self
            .http_client
            .post(self.annotate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            // The request URL carries the API key.
            .map_err(|e| VisionError::from_reqwest(e.without_url(), self.timeout))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(VisionError::RateLimited);
        }
        if !status.is_success() {
            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if body.len() > MAX_ERROR_BODY_LEN {
                let cut = (0..=MAX_ERROR_BODY_LEN)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(VisionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<VisionResponse>()
            .await
            .map_err(|e| VisionError::from_reqwest(e.without_url(), self.timeout))
    }

    fn extract_result(response: VisionResponse) -> Result<SafeSearchResult, VisionError> {
        let first = response
            .responses
            .and_then(|responses| responses.into_iter().next())
            .ok_or_else(|| VisionError::InvalidResponse("Empty responses array".to_string()))?;

        if let Some(error) = first.error {
            return Err(VisionError::Api {
                code: error.code,
                message: error.message.unwrap_or_default(),
            });
        }

        let annotation = first.safe_search_annotation.ok_or_else(|| {
            VisionError::InvalidResponse("Missing safeSearchAnnotation".to_string())
        })?;

        Ok(annotation.into())
    }
}

#[async_trait]
impl SafeSearchClassifier for GoogleVisionClient {
    fn name(&self) -> &str {
        "google_vision"
    }

    #[tracing::instrument(skip(self), fields(classifier = "google_vision"))]
    async fn classify(&self, image: ImageSource) -> Result<SafeSearchResult, VisionError> {
        let start = std::time::Instant::now();
        let response = self.annotate(&image).await?;
        let result = Self::extract_result(response)?;

        tracing::info!(
            adult = %result.adult,
            violence = %result.violence,
            racy = %result.racy,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Google Cloud Vision safe-search completed"
        );

        Ok(result)
    }
}

// Google Cloud Vision API response types
#[derive(Debug, Deserialize)]
struct VisionResponse {
    responses: Option<Vec<AnnotateImageResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    safe_search_annotation: Option<SafeSearchAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct SafeSearchAnnotation {
    adult: Option<Likelihood>,
    spoof: Option<Likelihood>,
    medical: Option<Likelihood>,
    violence: Option<Likelihood>,
    racy: Option<Likelihood>,
}

impl From<SafeSearchAnnotation> for SafeSearchResult {
    fn from(annotation: SafeSearchAnnotation) -> Self {
        SafeSearchResult {
            adult: annotation.adult.unwrap_or_default(),
            spoof: annotation.spoof.unwrap_or_default(),
            medical: annotation.medical.unwrap_or_default(),
            violence: annotation.violence.unwrap_or_default(),
            racy: annotation.racy.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Status {
    code: Option<i32>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::io::Write;

    fn config(endpoint: String) -> VisionConfig {
        VisionConfig {
            api_key: "test-key".to_string(),
            endpoint,
            timeout: Duration::from_secs(5),
            max_attempts: 1,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    fn jpeg_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        file
    }

    #[tokio::test]
    async fn test_classify_local_file() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "requests": [{
                    "image": { "content": "/9j/4A==" },
                    "features": [{ "type": "SAFE_SEARCH_DETECTION" }]
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"responses":[{"safeSearchAnnotation":{
                    "adult":"UNLIKELY","spoof":"VERY_UNLIKELY","medical":"UNLIKELY",
                    "violence":"VERY_UNLIKELY","racy":"POSSIBLE"}}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let file = jpeg_file();
        let result = client
            .classify(ImageSource::Path(file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(result.adult, Likelihood::Unlikely);
        assert_eq!(result.violence, Likelihood::VeryUnlikely);
        assert_eq!(result.racy, Likelihood::Possible);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_classify_uri_sends_image_source() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "requests": [{
                    "image": { "source": { "imageUri": "https://example.com/cat.jpg" } }
                }]
            })))
            .with_status(200)
            .with_body(r#"{"responses":[{"safeSearchAnnotation":{"adult":"LIKELY"}}]}"#)
            .create_async()
            .await;

        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let result = client
            .classify(ImageSource::Uri("https://example.com/cat.jpg".to_string()))
            .await
            .unwrap();

        assert_eq!(result.adult, Likelihood::Likely);
        assert_eq!(result.medical, Likelihood::Unknown);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_transient() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let err = client
            .classify(ImageSource::Uri("https://example.com/a.jpg".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, VisionError::Http { status: 403, .. }));
        assert!(!err.is_transient());
        assert!(!err.to_string().contains("test-key"));
    }

    #[tokio::test]
    async fn test_server_error_and_quota_are_transient() {
        let mut server = mockito::Server::new_async().await;
        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let image = ImageSource::Uri("https://example.com/a.jpg".to_string());

        let unavailable = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let err = client.classify(image.clone()).await.unwrap_err();
        assert!(err.is_transient());
        unavailable.remove_async().await;

        let _quota = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;
        let err = client.classify(image).await.unwrap_err();
        assert!(matches!(err, VisionError::RateLimited));
    }

    #[tokio::test]
    async fn test_per_image_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#)
            .create_async()
            .await;

        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let err = client
            .classify(ImageSource::Uri("https://example.com/a.jpg".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, VisionError::Api { code: Some(3), ref message } if message == "Bad image data."));
    }

    #[tokio::test]
    async fn test_missing_annotation_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/images:annotate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"responses":[{}]}"#)
            .create_async()
            .await;

        let client = GoogleVisionClient::new(&config(server.url())).unwrap();
        let err = client
            .classify(ImageSource::Uri("https://example.com/a.jpg".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, VisionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_before_request() {
        let client = GoogleVisionClient::new(&config("http://127.0.0.1:9".to_string())).unwrap();
        let err = client
            .classify(ImageSource::Path("/nonexistent/upload.jpg".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, VisionError::ImageRead(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GoogleVisionClient::new(&config("http://localhost".to_string())).unwrap();
        assert!(!format!("{:?}", client).contains("test-key"));
    }
}
