//! OCR and text extraction backends.
//!
//! The pipeline talks to three collaborators through traits:
//! - `TextExtractionBackend`: per-page text layer (pdftotext by default)
//! - `PageRenderer`: lazily rasterizes pages that need OCR (pdftoppm)
//! - `OcrBackend`: turns a rendered page into text (Tesseract)

mod backend;
mod extractor;
mod model_utils;
mod pdf_utils;
mod renderer;
mod tesseract;

pub use backend::{OcrBackend, OcrError};
pub use extractor::{ExtractedPage, ExtractionError, PdfTextExtractor, TextExtractionBackend};
pub use model_utils::{check_binary, check_tools, ToolError};
pub use pdf_utils::{parse_pdf_info, PdfInfo};
pub use renderer::{PageRenderer, PdfPageRenderer, RenderError, RenderedImage, DEFAULT_DPI};
pub use tesseract::{TesseractBackend, DEFAULT_LANGUAGE};
