//! Test helpers: build the app around a fake classifier.
//!
//! Run from workspace root: `cargo test -p safelens-web`.

pub mod classifier;
pub mod fixtures;

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use safelens_core::Config;
use safelens_vision::SafeSearchClassifier;
use safelens_web::setup::routes;
use safelens_web::AppState;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub use classifier::{RecordedCall, RecordingClassifier};

pub const TEST_SESSION_SECRET: &str = "integration-test-session-secret";

/// Test application: server, the classifier it talks to, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub classifier: Arc<RecordingClassifier>,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Files currently in the upload directory
    pub fn stored_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn test_config(upload_dir: &Path, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("SESSION_SECRET".to_string(), TEST_SESSION_SECRET.to_string()),
        ("VISION_API_KEY".to_string(), "test-api-key".to_string()),
        (
            "UPLOAD_DIR".to_string(),
            upload_dir.to_string_lossy().into_owned(),
        ),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

/// App with `classifier` injected as-is
pub async fn setup_test_app(classifier: RecordingClassifier) -> TestApp {
    let classifier = Arc::new(classifier);
    setup_test_app_with(classifier.clone(), classifier).await
}

/// App with an arbitrary classifier stack; `recorder` is the innermost fake
pub async fn setup_test_app_with(
    recorder: Arc<RecordingClassifier>,
    classifier: Arc<dyn SafeSearchClassifier>,
) -> TestApp {
    let temp_dir = TempDir::new().expect("temp dir");
    let upload_dir = temp_dir.path().join("uploads");
    let config = test_config(&upload_dir, &[]);

    let state = AppState::new(config, classifier)
        .await
        .expect("app state");
    let router = routes::setup_routes(state).expect("routes");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        classifier: recorder,
        upload_dir,
        _temp_dir: temp_dir,
    }
}

/// A browser session: its cookie and the CSRF token from the last form
#[derive(Debug, Clone)]
pub struct Session {
    pub cookie: String,
    pub csrf_token: String,
}

/// `name=value` part of the session Set-Cookie header
pub fn session_cookie(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Value of the hidden csrf_token field
pub fn csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("csrf field") + marker.len();
    let end = html[start..].find('"').expect("csrf value end") + start;
    html[start..end].to_string()
}

pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn assert_redirect(response: &TestResponse, to: &str) {
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

/// Open the upload form in a fresh session
pub async fn start_session(server: &TestServer) -> Session {
    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    Session {
        cookie: session_cookie(&response),
        csrf_token: csrf_token(&response.text()),
    }
}

pub async fn get_as(server: &TestServer, session: &Session, path: &str) -> TestResponse {
    server
        .get(path)
        .add_header(header::COOKIE, session.cookie.clone())
        .await
}

pub async fn post_form(server: &TestServer, session: &Session, form: MultipartForm) -> TestResponse {
    server
        .post("/")
        .add_header(header::COOKIE, session.cookie.clone())
        .multipart(form)
        .await
}

/// The upload form as a browser would post it
pub fn upload_form(session: &Session, filename: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .add_text("csrf_token", session.csrf_token.clone())
        .add_text("instructions", "Summarize the JPG.")
        .add_part(
            "image_file",
            Part::bytes(data).file_name(filename).mime_type(content_type),
        )
}

pub fn jpeg_form(session: &Session, filename: &str, data: Vec<u8>) -> MultipartForm {
    upload_form(session, filename, "image/jpeg", data)
}
