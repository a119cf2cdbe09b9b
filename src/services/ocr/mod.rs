//! Document processing pipeline.
//!
//! extraction -> classification -> OCR dispatch -> reconciliation -> assembly
//!
//! Per-page OCR problems degrade quietly (the page keeps its extracted
//! text). Only document-level failures surface as `PipelineError`.

mod assemble;
mod classify;
mod dispatch;
mod merge;
mod types;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::models::{Document, Page, PageSet, SourceDocument, SourceMetadata};
use crate::ocr::{
    ExtractionError, OcrBackend, PageRenderer, TextExtractionBackend, DEFAULT_LANGUAGE,
};

pub use assemble::{
    assemble, AssemblyMetadata, EmptyContentError, DEFAULT_SOURCE, NO_AUTHOR, NO_DESCRIPTION,
};
pub use classify::{classify, insufficient_pages, DEFAULT_THRESHOLD};
pub use dispatch::{
    default_concurrency, OcrDispatcher, DEFAULT_TASK_TIMEOUT, MAX_DEFAULT_CONCURRENCY,
};
pub use merge::{from_fallback, ocr_wins, reconcile, FallbackFailure, Reconciliation};
pub use types::{OcrOutcome, OcrTask, PipelineEvent, QualityVerdict};

/// Document-level failures. Each names the document it happened to.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Text extraction failed for {document}: {source}")]
    Extraction {
        document: String,
        #[source]
        source: ExtractionError,
    },

    #[error("OCR failed for {document}: {reason}")]
    WholeDocumentOcr { document: String, reason: String },

    #[error(transparent)]
    EmptyContent(#[from] EmptyContentError),
}

impl PipelineError {
    /// Stable identifier for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => "extraction_failure",
            Self::WholeDocumentOcr { .. } => "whole_document_ocr_failure",
            Self::EmptyContent(_) => "empty_content",
        }
    }

    /// The document this failure belongs to.
    pub fn document(&self) -> &str {
        match self {
            Self::Extraction { document, .. } | Self::WholeDocumentOcr { document, .. } => document,
            Self::EmptyContent(e) => &e.document,
        }
    }
}

/// Per-invocation tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Minimum trimmed characters for a page to skip OCR.
    pub threshold: usize,
    /// OCR languages in preference order.
    pub language_hints: Vec<String>,
    /// Maximum OCR calls in flight.
    pub max_concurrency: usize,
    /// Per-page OCR timeout.
    pub per_task_timeout: Duration,
}

/// A `PipelineOptions` value the pipeline can't run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid pipeline option {field}: {message}")]
pub struct InvalidOptions {
    pub field: &'static str,
    pub message: &'static str,
}

impl PipelineOptions {
    /// Reject zero threshold, zero concurrency, or a zero timeout.
    pub fn validate(&self) -> Result<(), InvalidOptions> {
        let invalid = |field: &'static str, message: &'static str| -> Result<(), InvalidOptions> {
            Err(InvalidOptions { field, message })
        };

        if self.threshold == 0 {
            return invalid("threshold", "must be at least 1");
        }
        if self.max_concurrency == 0 {
            return invalid("max_concurrency", "must be at least 1");
        }
        if self.per_task_timeout.is_zero() {
            return invalid("per_task_timeout", "must be greater than zero");
        }
        Ok(())
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            language_hints: vec![DEFAULT_LANGUAGE.to_string()],
            max_concurrency: default_concurrency(),
            per_task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}

/// Turns a source document into a `Document`.
///
/// Holds no per-document state; one pipeline can process any number of
/// documents, one call at a time or concurrently.
pub struct DocumentPipeline {
    extractor: Arc<dyn TextExtractionBackend>,
    renderer: Arc<dyn PageRenderer>,
    ocr: Arc<dyn OcrBackend>,
    options: PipelineOptions,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl DocumentPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractionBackend>,
        renderer: Arc<dyn PageRenderer>,
        ocr: Arc<dyn OcrBackend>,
        options: PipelineOptions,
    ) -> Result<Self, InvalidOptions> {
        options.validate()?;
        Ok(Self {
            extractor,
            renderer,
            ocr,
            options,
            events: None,
        })
    }

    /// Emit progress events on this channel.
    pub fn with_events(mut self, events: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process one document.
    pub async fn process(
        &self,
        source: &SourceDocument,
        overrides: &SourceMetadata,
    ) -> Result<Document, PipelineError> {
        let document_name = source.name();

        self.emit(PipelineEvent::ExtractionStarted {
            document: document_name.clone(),
        })
        .await;

        let extracted = self
            .extractor
            .extract(source)
            .await
            .map_err(|e| PipelineError::Extraction {
                document: document_name.clone(),
                source: e,
            })?;

        let backend_metadata = extracted
            .first()
            .map(|p| p.metadata.clone())
            .unwrap_or_default();
        let pages = PageSet::from_pages(
            extracted
                .into_iter()
                .map(|p| Page::new(p.page_number, p.text)),
        )
        .map_err(|e| PipelineError::Extraction {
            document: document_name.clone(),
            source: e.into(),
        })?;

        self.emit(PipelineEvent::ExtractionCompleted {
            document: document_name.clone(),
            pages: pages.len(),
        })
        .await;
        tracing::info!("Extracted {} pages from {}", pages.len(), document_name);

        let merged = if pages.is_empty() {
            self.ocr_whole_document(source, &document_name).await?
        } else {
            self.ocr_insufficient_pages(source, pages).await
        };

        let document = assemble(
            &merged.pages,
            AssemblyMetadata {
                document_name: document_name.clone(),
                overrides: overrides.clone(),
                backend: backend_metadata,
                ocr_pages: merged.replaced,
            },
        )?;

        self.emit(PipelineEvent::DocumentAssembled {
            document: document_name,
            word_count: document.word_count,
        })
        .await;

        Ok(document)
    }

    /// Classify pages and OCR only the ones below threshold.
    async fn ocr_insufficient_pages(&self, source: &SourceDocument, pages: PageSet) -> Reconciliation {
        let verdicts = classify(&pages, self.options.threshold);
        let to_ocr = insufficient_pages(&verdicts);

        self.emit(PipelineEvent::Classified {
            sufficient: verdicts.len() - to_ocr.len(),
            insufficient: to_ocr.len(),
        })
        .await;

        if to_ocr.is_empty() {
            tracing::debug!("All {} pages meet the threshold, skipping OCR", pages.len());
            return reconcile(pages, &verdicts, Vec::new());
        }

        tracing::info!(
            "{} of {} pages below {} characters, running OCR",
            to_ocr.len(),
            pages.len(),
            self.options.threshold
        );

        let outcomes = self.run_ocr(source, &to_ocr).await;
        let merged = reconcile(pages, &verdicts, outcomes);

        self.emit(PipelineEvent::Merged {
            replaced: merged.replaced.len(),
            failed: merged.failed.len(),
        })
        .await;

        merged
    }

    /// No text layer at all: OCR every page and use the results directly.
    async fn ocr_whole_document(
        &self,
        source: &SourceDocument,
        document_name: &str,
    ) -> Result<Reconciliation, PipelineError> {
        let page_count = self.renderer.page_count(source).await.map_err(|e| {
            PipelineError::WholeDocumentOcr {
                document: document_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            "{} has no extractable text, OCR'ing all {} pages",
            document_name,
            page_count
        );
        self.emit(PipelineEvent::FallbackStarted {
            document: document_name.to_string(),
            pages: page_count,
        })
        .await;

        let all_pages: Vec<u32> = (1..=page_count).collect();
        let outcomes = self.run_ocr(source, &all_pages).await;

        from_fallback(page_count, outcomes).map_err(|e| PipelineError::WholeDocumentOcr {
            document: document_name.to_string(),
            reason: e.reason,
        })
    }

    async fn run_ocr(&self, source: &SourceDocument, page_numbers: &[u32]) -> Vec<OcrOutcome> {
        self.emit(PipelineEvent::OcrStarted {
            total_pages: page_numbers.len(),
        })
        .await;

        let mut dispatcher = OcrDispatcher::new(
            self.ocr.clone(),
            self.options.max_concurrency,
            self.options.per_task_timeout,
        );
        if let Some(tx) = &self.events {
            dispatcher = dispatcher.with_events(tx.clone());
        }

        let mut outcomes = dispatcher
            .dispatch_pages(
                Arc::new(source.clone()),
                self.renderer.clone(),
                page_numbers,
                &self.options.language_hints,
            )
            .await;
        outcomes.sort_by_key(|o| o.page_number);

        let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
        self.emit(PipelineEvent::OcrComplete {
            succeeded,
            failed: outcomes.len() - succeeded,
        })
        .await;

        outcomes
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
