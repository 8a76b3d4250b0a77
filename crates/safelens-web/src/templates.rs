//! HTML rendering
//!
//! Pages are tera templates compiled into the binary. Handlers build one of
//! the view structs below and hand it to [`Templates::render`]; templates only
//! lay out what the view already computed.
//!
//! Autoescaping is on for every `.html` template, so user input (filenames,
//! instructions) can be passed through as-is.

use safelens_core::{AnalysisRecord, SafeSearchCategory, UploadValidationError};
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tera::{Context, Tera};
use thiserror::Error;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const RESULTS_TEMPLATE: &str = "pdf_results.html";
pub const ERROR_TEMPLATE: &str = "error.html";

/// Error type for template operations
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Template compilation failed: {0}")]
    Compile(String),
}

impl From<tera::Error> for TemplateError {
    fn from(e: tera::Error) -> Self {
        match e.kind {
            tera::ErrorKind::TemplateNotFound(name) => Self::NotFound(name),
            _ => Self::Render(error_chain(&e)),
        }
    }
}

/// Tera keeps the useful part of a failure in the source chain
fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

mod embedded {
    pub const BASE: &str = include_str!("../templates/base.html");
    pub const INDEX: &str = include_str!("../templates/index.html");
    pub const PDF_RESULTS: &str = include_str!("../templates/pdf_results.html");
    pub const ERROR: &str = include_str!("../templates/error.html");

    pub const APP_CSS: &str = include_str!("../static/app.css");
}

pub use embedded::APP_CSS;

static GLOBAL: LazyLock<Result<Templates, TemplateError>> = LazyLock::new(Templates::new);

#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field(
                "templates",
                &self.tera.get_template_names().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Templates {
    /// Compile the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", embedded::BASE),
            (INDEX_TEMPLATE, embedded::INDEX),
            (RESULTS_TEMPLATE, embedded::PDF_RESULTS),
            (ERROR_TEMPLATE, embedded::ERROR),
        ])
        .map_err(|e| TemplateError::Compile(error_chain(&e)))?;
        tera.autoescape_on(vec![".html"]);

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Process-wide instance, compiled on first use
    pub fn global() -> Result<&'static Templates, TemplateError> {
        GLOBAL.as_ref().map_err(Clone::clone)
    }

    pub fn render<T: Serialize>(&self, template: &str, view: &T) -> Result<String, TemplateError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(template, &context)?)
    }
}

/// Upload form
#[derive(Debug, Clone, Serialize)]
pub struct IndexView {
    pub csrf_token: String,
    pub instructions: String,
    pub file_errors: Vec<String>,
    pub instructions_errors: Vec<String>,
    pub flash: Option<String>,
    pub max_file_size_mb: usize,
}

impl IndexView {
    pub fn new(csrf_token: String, instructions: String, max_file_size_bytes: usize) -> Self {
        Self {
            csrf_token,
            instructions,
            file_errors: Vec::new(),
            instructions_errors: Vec::new(),
            flash: None,
            max_file_size_mb: max_file_size_bytes / 1024 / 1024,
        }
    }

    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash;
        self
    }

    /// Sort validation failures under the field they belong to
    pub fn with_errors(mut self, errors: &[UploadValidationError]) -> Self {
        for error in errors {
            match error.field() {
                safelens_core::validation::INSTRUCTIONS_FIELD => {
                    self.instructions_errors.push(error.user_message())
                }
                _ => self.file_errors.push(error.user_message()),
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub name: &'static str,
    pub label: &'static str,
    pub likelihood: &'static str,
    pub flagged: bool,
}

/// Results page
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub filename: String,
    pub instructions: String,
    pub analyzed_at: String,
    pub categories: Vec<CategoryView>,
    pub flagged: bool,
}

fn category_label(category: SafeSearchCategory) -> &'static str {
    match category {
        SafeSearchCategory::Adult => "Adult",
        SafeSearchCategory::Spoof => "Spoof",
        SafeSearchCategory::Medical => "Medical",
        SafeSearchCategory::Violence => "Violence",
        SafeSearchCategory::Racy => "Racy",
    }
}

impl From<&AnalysisRecord> for ResultsView {
    fn from(record: &AnalysisRecord) -> Self {
        let categories = record
            .result
            .categories()
            .map(|(category, likelihood)| CategoryView {
                name: category.as_str(),
                label: category_label(category),
                likelihood: likelihood.as_str(),
                flagged: likelihood.is_flagged(),
            })
            .collect();

        Self {
            filename: record.original_filename.clone(),
            instructions: record.instructions.clone(),
            analyzed_at: record
                .analyzed_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
            categories,
            flagged: record.result.is_flagged(),
        }
    }
}

/// Generic failure page
#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub status: u16,
    pub message: String,
    pub suggested_action: Option<String>,
    pub details: Option<String>,
}
