//! Configuration module
//!
//! Process configuration is read from the environment (a `.env` file is honoured
//! through dotenvy) and validated once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1024;
const SESSION_TTL_SECS: u64 = 3600;
const SESSION_MAX_ENTRIES: u64 = 10_000;
const MIN_PRODUCTION_SECRET_LEN: usize = 32;
const VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1";
const VISION_TIMEOUT_SECS: u64 = 30;
const VISION_MAX_ATTEMPTS: u32 = 3;
const VISION_RETRY_BASE_DELAY_MS: u64 = 500;
const MAX_FILE_SIZE_MB: usize = 10;

/// Listener and runtime settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub environment: String,
    pub http_concurrency_limit: usize,
    pub log_format: String,
}

/// Signed session cookie and per-session result cache
#[derive(Clone)]
pub struct SessionConfig {
    /// HMAC key for session cookies and CSRF tokens. Never log this.
    pub secret: String,
    pub ttl: Duration,
    pub max_entries: u64,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

/// Google Cloud Vision client settings
#[derive(Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

/// Upload limits and the transient storage location
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub vision: VisionConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server = ServerConfig {
            bind_address: lookup("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            environment,
            http_concurrency_limit: parse_or(
                &lookup,
                "HTTP_CONCURRENCY_LIMIT",
                DEFAULT_HTTP_CONCURRENCY_LIMIT,
            )?
            .max(1),
            log_format: lookup("LOG_FORMAT")
                .unwrap_or_else(|| "compact".to_string())
                .to_lowercase(),
        };

        let session = SessionConfig {
            secret: lookup("SESSION_SECRET")
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!("SESSION_SECRET must be set to sign session cookies")
                })?,
            ttl: Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", SESSION_TTL_SECS)?),
            max_entries: parse_or(&lookup, "SESSION_MAX_ENTRIES", SESSION_MAX_ENTRIES)?,
        };

        let vision = VisionConfig {
            api_key: lookup("VISION_API_KEY")
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("VISION_API_KEY must be set"))?,
            endpoint: lookup("VISION_ENDPOINT")
                .unwrap_or_else(|| VISION_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "VISION_TIMEOUT_SECS",
                VISION_TIMEOUT_SECS,
            )?),
            max_attempts: parse_or(&lookup, "VISION_MAX_ATTEMPTS", VISION_MAX_ATTEMPTS)?,
            retry_base_delay: Duration::from_millis(parse_or(
                &lookup,
                "VISION_RETRY_BASE_DELAY_MS",
                VISION_RETRY_BASE_DELAY_MS,
            )?),
        };

        let max_file_size_mb: usize = parse_or(&lookup, "MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?;
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large"))?;

        let upload = UploadConfig {
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("safelens-uploads")),
            max_file_size_bytes,
            allowed_extensions: split_list(
                lookup("ALLOWED_EXTENSIONS").unwrap_or_else(|| "jpg,jpeg".to_string()),
            ),
            allowed_content_types: split_list(
                lookup("ALLOWED_CONTENT_TYPES").unwrap_or_else(|| "image/jpeg".to_string()),
            ),
        };

        let config = Config {
            server,
            session,
            vision,
            upload,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.session.secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "SESSION_SECRET must be at least {} characters long in production",
                MIN_PRODUCTION_SECRET_LEN
            ));
        }

        if self.vision.max_attempts == 0 {
            return Err(anyhow::anyhow!("VISION_MAX_ATTEMPTS cannot be 0"));
        }

        if self.vision.timeout.is_zero() {
            return Err(anyhow::anyhow!("VISION_TIMEOUT_SECS cannot be 0"));
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB cannot be 0"));
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS cannot be empty"));
        }

        if self.session.max_entries == 0 {
            return Err(anyhow::anyhow!("SESSION_MAX_ENTRIES cannot be 0"));
        }

        Ok(())
    }
}

/// Parse an optional setting, failing on values that are present but malformed.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

fn split_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
