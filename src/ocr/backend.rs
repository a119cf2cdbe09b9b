//! OCR backend abstraction.
//!
//! The pipeline never talks to a concrete OCR engine directly; it hands a
//! rendered page plus language hints to whatever implements `OcrBackend`.

use async_trait::async_trait;
use thiserror::Error;

use super::model_utils::ToolError;
use super::renderer::RenderedImage;

/// Errors from OCR backends.
///
/// All of these are recoverable from the pipeline's point of view: a failed
/// page keeps its extracted text.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for OcrError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(hint) => OcrError::BackendNotAvailable(hint),
            ToolError::Failed { tool, stderr } => {
                OcrError::OcrFailed(format!("{} failed: {}", tool, stderr))
            }
            ToolError::Io(e) => OcrError::Io(e),
        }
    }
}

/// Trait for OCR backends.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Check if this backend is available (dependencies installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Recognize the text in a rendered page.
    ///
    /// `language_hints` are ordered by preference. Implementations must be
    /// cancel-safe: dropping the future abandons the call.
    async fn recognize(
        &self,
        image: &RenderedImage,
        language_hints: &[String],
    ) -> Result<String, OcrError>;
}
