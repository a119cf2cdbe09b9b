//! Page rendering for OCR.
//!
//! Pages are rasterized on demand, one at a time, so only pages that
//! actually need OCR ever get rendered.

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

use super::model_utils::{run_tool, ToolError, PDFTOPPM_NOT_FOUND};
use super::pdf_utils::{find_page_image, pdf_info};
use crate::models::SourceDocument;
use crate::utils::DocumentKind;

/// Default rasterization resolution; 300 DPI is what Tesseract is tuned for.
pub const DEFAULT_DPI: u32 = 300;

/// Errors from page rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer not available: {0}")]
    ToolNotFound(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Cannot render {0} documents")]
    UnsupportedFileType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ToolError> for RenderError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(hint) => RenderError::ToolNotFound(hint),
            ToolError::Failed { tool, stderr } => {
                RenderError::RenderFailed(format!("{} failed: {}", tool, stderr))
            }
            ToolError::Io(e) => RenderError::Io(e),
        }
    }
}

/// A rasterized page, owned by exactly one OCR task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Page this image was rendered from (1-indexed).
    pub page_number: u32,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: String,
}

impl RenderedImage {
    pub fn png(page_number: u32, bytes: Vec<u8>) -> Self {
        Self {
            page_number,
            bytes,
            mime_type: "image/png".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Produces page counts and page images for a document.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Number of renderable pages in the document.
    async fn page_count(&self, document: &SourceDocument) -> Result<u32, RenderError>;

    /// Rasterize one page (1-indexed).
    async fn render(
        &self,
        document: &SourceDocument,
        page_number: u32,
    ) -> Result<RenderedImage, RenderError>;
}

/// Renders PDF pages with pdftoppm; image files render as a single page.
pub struct PdfPageRenderer {
    dpi: u32,
}

impl Default for PdfPageRenderer {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl PdfPageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    async fn render_pdf_page(
        &self,
        document: &SourceDocument,
        page_number: u32,
    ) -> Result<RenderedImage, RenderError> {
        let temp_dir = TempDir::new()?;
        let page_str = page_number.to_string();
        let dpi_str = self.dpi.to_string();

        run_tool(
            Command::new("pdftoppm")
                .args(["-png", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
                .arg(document.path())
                .arg(temp_dir.path().join("page")),
            PDFTOPPM_NOT_FOUND,
        )
        .await?;

        let image_path = find_page_image(temp_dir.path(), page_number).ok_or_else(|| {
            RenderError::RenderFailed(format!("No image generated for page {}", page_number))
        })?;
        let bytes = tokio::fs::read(&image_path).await?;

        Ok(RenderedImage::png(page_number, bytes))
    }
}

#[async_trait]
impl PageRenderer for PdfPageRenderer {
    async fn page_count(&self, document: &SourceDocument) -> Result<u32, RenderError> {
        match document.kind() {
            DocumentKind::Pdf => Ok(pdf_info(document.path()).await?.pages),
            DocumentKind::Image => Ok(1),
            _ => Err(RenderError::UnsupportedFileType(document.mime_type.clone())),
        }
    }

    async fn render(
        &self,
        document: &SourceDocument,
        page_number: u32,
    ) -> Result<RenderedImage, RenderError> {
        match document.kind() {
            DocumentKind::Pdf => self.render_pdf_page(document, page_number).await,
            DocumentKind::Image if page_number == 1 => {
                let bytes = tokio::fs::read(document.path()).await?;
                Ok(RenderedImage {
                    page_number,
                    bytes,
                    mime_type: document.mime_type.clone(),
                })
            }
            DocumentKind::Image => Err(RenderError::PageOutOfRange {
                page: page_number,
                page_count: 1,
            }),
            _ => Err(RenderError::UnsupportedFileType(document.mime_type.clone())),
        }
    }
}
