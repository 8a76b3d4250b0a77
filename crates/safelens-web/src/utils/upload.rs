//! Multipart extraction for the upload form

use axum::extract::Multipart;
use safelens_core::validation::{FILE_FIELD, INSTRUCTIONS_FIELD};
use safelens_core::{AppError, UploadSubmission, DEFAULT_INSTRUCTIONS};

/// Hidden form field carrying the CSRF token
pub const CSRF_FIELD: &str = "csrf_token";

/// Everything the upload form posts
#[derive(Debug, Default)]
pub struct UploadForm {
    pub submission: UploadSubmission,
    pub csrf_token: Option<String>,
}

/// Read the upload form from a multipart body.
///
/// A file input left empty arrives as a part with an empty filename; it is
/// reported as no file. Only one `image_file` part is accepted. Unknown fields
/// are skipped.
pub async fn extract_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let mut seen_file = false;
    let mut instructions: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {}", e.body_text())))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FILE_FIELD => {
                if seen_file {
                    return Err(AppError::Validation(format!(
                        "Multiple file fields are not allowed; send exactly one field named '{}'",
                        FILE_FIELD
                    )));
                }
                seen_file = true;

                form.submission.filename = field
                    .file_name()
                    .map(|s: &str| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                form.submission.content_type = field.content_type().map(|s: &str| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file data: {}", e.body_text()))
                })?;
                form.submission.data = data.to_vec();
            }
            INSTRUCTIONS_FIELD => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read instructions: {}", e.body_text()))
                })?;
                instructions = Some(text);
            }
            CSRF_FIELD => {
                let token = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read form token: {}", e.body_text()))
                })?;
                form.csrf_token = Some(token);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    form.submission.instructions =
        instructions.unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string());

    Ok(form)
}
