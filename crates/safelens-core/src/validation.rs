//! Upload validation
//!
//! Checks a submitted form before anything touches the filesystem or the
//! vision service. All problems are collected so the form can show every
//! message at once.

use std::path::Path;

use validator::Validate;

use crate::models::UploadSubmission;

/// Form field holding the image
pub const FILE_FIELD: &str = "image_file";
/// Form field holding the free-text instructions
pub const INSTRUCTIONS_FIELD: &str = "instructions";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadValidationError {
    #[error("No file attached")]
    MissingFile,

    #[error("Empty file")]
    EmptyFile,

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid instructions: {0}")]
    InvalidInstructions(String),
}

impl UploadValidationError {
    /// Name of the form field the message belongs to
    pub fn field(&self) -> &'static str {
        match self {
            UploadValidationError::InvalidInstructions(_) => INSTRUCTIONS_FIELD,
            _ => FILE_FIELD,
        }
    }

    /// Inline message shown next to the field
    pub fn user_message(&self) -> String {
        match self {
            UploadValidationError::MissingFile => "This field is required.".to_string(),
            UploadValidationError::EmptyFile => "The selected file is empty.".to_string(),
            UploadValidationError::InvalidExtension { .. } => "Please select a JPG.".to_string(),
            UploadValidationError::InvalidContentType { .. } => {
                "The selected file is not a JPEG image.".to_string()
            }
            UploadValidationError::FileTooLarge { max, .. } => format!(
                "The file exceeds the maximum size of {} MB.",
                max / 1024 / 1024
            ),
            UploadValidationError::InvalidInstructions(msg) => msg.clone(),
        }
    }
}

/// Upload validator
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    /// Validate a whole submission, returning every problem found
    pub fn validate(&self, submission: &UploadSubmission) -> Result<(), Vec<UploadValidationError>> {
        let mut errors = Vec::new();

        if let Err(field_errors) = submission.validate() {
            for (_, messages) in field_errors.field_errors() {
                for message in messages.iter() {
                    let text = message
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| message.code.to_string());
                    errors.push(UploadValidationError::InvalidInstructions(text));
                }
            }
        }

        match submission.filename.as_deref() {
            Some(filename) if submission.has_file() => {
                if let Err(e) = self.validate_extension(filename) {
                    errors.push(e);
                } else {
                    if let Err(e) = self.validate_file_size(submission.data.len()) {
                        errors.push(e);
                    }
                    if let Some(content_type) = submission.content_type.as_deref() {
                        if let Err(e) = self.validate_content_type(content_type) {
                            errors.push(e);
                        }
                    }
                }
            }
            _ => errors.push(UploadValidationError::MissingFile),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), UploadValidationError> {
        if size == 0 {
            return Err(UploadValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(UploadValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), UploadValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type. Parameters such as `; charset=` are ignored.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), UploadValidationError> {
        let normalized = content_type
            .split(';')
            .next()
            .map(|s| s.trim())
            .unwrap_or(content_type)
            .to_lowercase();

        // Browsers send octet-stream when they cannot guess; the extension check already ran.
        if normalized == "application/octet-stream" {
            return Ok(());
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(UploadValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }
}

/// Sanitize an uploaded filename for display.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`. The result is never used as a storage path.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        return "file".to_string();
    }

    sanitized
}
