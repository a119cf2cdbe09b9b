//! Text-layer extraction from documents using pdftotext.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use super::model_utils::{run_tool, ToolError, PDFTOTEXT_NOT_FOUND};
use super::pdf_utils::{pdf_info, split_pages, PdfInfo};
use crate::models::{PageSetError, SourceDocument, SourceMetadata};
use crate::utils::DocumentKind;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Invalid page sequence: {0}")]
    InvalidPages(#[from] PageSetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for ExtractionError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(hint) => ExtractionError::ToolNotFound(hint),
            ToolError::Failed { tool, stderr } => {
                ExtractionError::ExtractionFailed(format!("{} failed: {}", tool, stderr))
            }
            ToolError::Io(e) => ExtractionError::Io(e),
        }
    }
}

/// One page of text-layer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Page number (1-indexed).
    pub page_number: u32,
    pub text: String,
    /// Metadata the backend associates with this page.
    pub metadata: SourceMetadata,
}

/// Parses a document into ordered page texts.
#[async_trait]
pub trait TextExtractionBackend: Send + Sync {
    /// Extract per-page text.
    ///
    /// An empty list means the document has no usable text layer at all
    /// (e.g. a scan), which sends it down the whole-document OCR path.
    async fn extract(&self, document: &SourceDocument) -> Result<Vec<ExtractedPage>, ExtractionError>;
}

/// Text extractor backed by Poppler's pdftotext, in -layout mode.
#[derive(Debug, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Create a new text extractor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run pdftotext on a whole PDF file.
    async fn run_pdftotext(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        let mut cmd = Command::new("pdftotext");
        cmd.args(["-layout", "-enc", "UTF-8"])
            .arg(document.path())
            .arg("-"); // Output to stdout

        let stdout = run_tool(&mut cmd, PDFTOTEXT_NOT_FOUND).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn extract_pdf(
        &self,
        document: &SourceDocument,
    ) -> Result<Vec<ExtractedPage>, ExtractionError> {
        let info = pdf_info(document.path()).await?;
        if info.pages == 0 {
            return Err(ExtractionError::ExtractionFailed(format!(
                "pdfinfo reported no pages for {}",
                document.name()
            )));
        }

        let mut texts = split_pages(&self.run_pdftotext(document).await?);
        if texts.len() != info.pages as usize {
            tracing::debug!(
                "pdftotext produced {} pages for {}, pdfinfo reported {}",
                texts.len(),
                document.name(),
                info.pages
            );
            texts.resize(info.pages as usize, String::new());
        }

        if texts.iter().all(|t| t.trim().is_empty()) {
            tracing::debug!("{} has no text layer", document.name());
            return Ok(Vec::new());
        }

        let metadata = metadata_from_info(&info);
        Ok(texts
            .into_iter()
            .zip(1u32..)
            .map(|(text, page_number)| ExtractedPage {
                page_number,
                text,
                metadata: metadata.clone(),
            })
            .collect())
    }
}

fn metadata_from_info(info: &PdfInfo) -> SourceMetadata {
    SourceMetadata {
        title: info.title.clone(),
        author: info.author.clone(),
        description: info.subject.clone(),
        source: Some("pdf file uploaded by the user.".to_string()),
    }
}

#[async_trait]
impl TextExtractionBackend for PdfTextExtractor {
    async fn extract(&self, document: &SourceDocument) -> Result<Vec<ExtractedPage>, ExtractionError> {
        match document.kind() {
            DocumentKind::Pdf => self.extract_pdf(document).await,
            // Images have no text layer; they are OCR'd as a whole.
            DocumentKind::Image => Ok(Vec::new()),
            DocumentKind::Text => {
                let text = tokio::fs::read_to_string(document.path()).await?;
                Ok(vec![ExtractedPage {
                    page_number: 1,
                    text,
                    metadata: SourceMetadata::default(),
                }])
            }
            DocumentKind::Other => Err(ExtractionError::UnsupportedFileType(
                document.mime_type.clone(),
            )),
        }
    }
}
