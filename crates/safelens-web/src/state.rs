//! Application state shared by every handler.

use anyhow::{Context, Result};
use safelens_core::{Config, UploadValidator};
use safelens_infra::{SessionSettings, Signer};
use safelens_storage::TempFileStore;
use safelens_vision::SafeSearchClassifier;
use std::sync::Arc;

use crate::session_store::SessionStore;
use crate::templates::Templates;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Injected at startup; tests pass a fake
    pub classifier: Arc<dyn SafeSearchClassifier>,
    pub temp_files: TempFileStore,
    pub sessions: SessionStore,
    pub validator: Arc<UploadValidator>,
    pub session_settings: Arc<SessionSettings>,
    pub templates: Templates,
}

impl AppState {
    pub async fn new(
        config: Config,
        classifier: Arc<dyn SafeSearchClassifier>,
    ) -> Result<Arc<Self>> {
        let temp_files = TempFileStore::new(config.upload.upload_dir.clone())
            .await
            .with_context(|| {
                format!(
                    "Failed to prepare upload directory {}",
                    config.upload.upload_dir.display()
                )
            })?;

        let signer = Signer::new(&config.session.secret)
            .map_err(|e| anyhow::anyhow!("Invalid SESSION_SECRET: {}", e))?;
        let session_settings = Arc::new(SessionSettings::new(
            signer,
            config.is_production(),
            config.session.ttl,
        ));

        let validator = Arc::new(UploadValidator::new(
            config.upload.max_file_size_bytes,
            config.upload.allowed_extensions.clone(),
            config.upload.allowed_content_types.clone(),
        ));

        let templates = Templates::global()
            .context("Failed to compile page templates")?
            .clone();

        Ok(Arc::new(Self {
            sessions: SessionStore::new(&config.session),
            config,
            classifier,
            temp_files,
            validator,
            session_settings,
            templates,
        }))
    }
}
