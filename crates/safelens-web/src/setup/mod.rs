//! Application setup and initialization
//!
//! Everything between a loaded [`Config`] and a ready [`axum::Router`] lives
//! here, so the binary and the integration tests build the app the same way.

pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use safelens_core::Config;
use safelens_vision::{GoogleVisionClient, RetryPolicy, RetryingClassifier, SafeSearchClassifier};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Telemetry first so configuration warnings are emitted
    safelens_infra::init_telemetry(&config.server.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.server.environment,
        "Configuration loaded and validated successfully"
    );

    let classifier = setup_classifier(&config)?;
    let state = AppState::new(config, classifier).await?;
    let router = routes::setup_routes(state.clone())?;

    Ok((state, router))
}

/// Google Vision client behind the retry policy
pub fn setup_classifier(config: &Config) -> Result<Arc<dyn SafeSearchClassifier>> {
    let client = GoogleVisionClient::new(&config.vision)
        .context("Failed to create the Vision API client")?;
    let policy = RetryPolicy::from_config(&config.vision);

    tracing::info!(
        endpoint = %config.vision.endpoint,
        max_attempts = policy.max_attempts,
        attempt_timeout_secs = policy.attempt_timeout.as_secs(),
        "Vision classifier configured"
    );

    Ok(Arc::new(RetryingClassifier::new(Arc::new(client), policy)))
}
