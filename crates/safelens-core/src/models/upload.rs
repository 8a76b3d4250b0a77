use validator::Validate;

/// Pre-filled value of the instructions field
pub const DEFAULT_INSTRUCTIONS: &str = "Summarize the JPG.";

/// Maximum accepted length of the instructions field
pub const MAX_INSTRUCTIONS_LEN: u64 = 2000;

/// A submitted upload form, before validation.
///
/// `filename` is `None` when the file field was missing or left empty by the
/// browser.
#[derive(Debug, Clone, Default, Validate)]
pub struct UploadSubmission {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    #[validate(length(
        max = MAX_INSTRUCTIONS_LEN,
        message = "Instructions must be at most 2000 characters."
    ))]
    pub instructions: String,
}

impl UploadSubmission {
    pub fn has_file(&self) -> bool {
        self.filename
            .as_deref()
            .map(|name| !name.trim().is_empty())
            .unwrap_or(false)
    }
}
