//! Pipeline types and events.

use crate::ocr::RenderedImage;

/// Events emitted during document processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Text-layer extraction started
    ExtractionStarted { document: String },
    /// Text-layer extraction completed
    ExtractionCompleted { document: String, pages: usize },
    /// No text layer; every page will be OCR'd
    FallbackStarted { document: String, pages: u32 },
    /// Pages tagged against the threshold
    Classified { sufficient: usize, insufficient: usize },
    /// OCR dispatch started
    OcrStarted { total_pages: usize },
    /// One page's OCR finished (successfully or not)
    PageOcrFinished { page_number: u32, succeeded: bool },
    /// OCR dispatch complete
    OcrComplete { succeeded: usize, failed: usize },
    /// Reconciliation complete
    Merged { replaced: usize, failed: usize },
    /// Final document built
    DocumentAssembled { document: String, word_count: usize },
}

/// Per-page sufficiency decision. Derived each run, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityVerdict {
    pub page_number: u32,
    pub sufficient: bool,
}

/// One unit of OCR work.
#[derive(Debug, Clone)]
pub struct OcrTask {
    pub page_number: u32,
    pub image: RenderedImage,
    /// Languages to recognize, in preference order.
    pub language_hints: Vec<String>,
}

/// Outcome of one OCR task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOutcome {
    pub page_number: u32,
    /// Recognized text; empty on failure.
    pub text: String,
    pub succeeded: bool,
    pub error_reason: Option<String>,
}

impl OcrOutcome {
    pub fn success(page_number: u32, text: String) -> Self {
        Self {
            page_number,
            text,
            succeeded: true,
            error_reason: None,
        }
    }

    pub fn failure(page_number: u32, reason: impl Into<String>) -> Self {
        Self {
            page_number,
            text: String::new(),
            succeeded: false,
            error_reason: Some(reason.into()),
        }
    }
}
