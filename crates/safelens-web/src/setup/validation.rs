//! Configuration validation
//!
//! Startup checks that go beyond [`Config::validate`]: they need the
//! filesystem or only warrant a warning.

use anyhow::Result;
use safelens_core::Config;

/// Validate critical configuration values
///
/// Fails fast on settings that would break every request; merely unusual
/// settings are logged.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let upload_dir = &config.upload.upload_dir;
    if upload_dir.exists() && !upload_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "UPLOAD_DIR {} exists but is not a directory",
            upload_dir.display()
        ));
    }

    if !config
        .upload
        .allowed_extensions
        .iter()
        .any(|ext| ext == "jpg" || ext == "jpeg")
    {
        tracing::warn!(
            extensions = %config.upload.allowed_extensions.join(","),
            "ALLOWED_EXTENSIONS does not include jpg - JPEG uploads will be rejected"
        );
    }

    if config.vision.max_attempts > 10 {
        tracing::warn!(
            max_attempts = config.vision.max_attempts,
            "VISION_MAX_ATTEMPTS is very high - failed uploads will hold a request for a long time"
        );
    }

    if config.server.log_format != "json" && config.server.log_format != "compact" {
        tracing::warn!(
            log_format = %config.server.log_format,
            "Unknown LOG_FORMAT, falling back to compact"
        );
    }

    Ok(())
}
