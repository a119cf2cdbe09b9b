//! End-to-end pipeline tests
//!
//! Runs `DocumentPipeline` against in-memory extraction, rendering, and OCR
//! backends so every path can be exercised without poppler or tesseract.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use ocrmerge::ocr::{
    ExtractedPage, ExtractionError, OcrBackend, OcrError, PageRenderer, RenderError,
    RenderedImage, TextExtractionBackend,
};
use ocrmerge::{
    DocumentPipeline, InvalidOptions, PipelineError, PipelineEvent, PipelineOptions,
    SourceDocument, SourceMetadata,
};

const LONG_PAGE_ONE: &str =
    "This first page has a perfectly good text layer with well over fifty characters. ";
const LONG_PAGE_THREE: &str =
    "The third page is also fine and carries more than enough extracted text to keep.";

/// Text-layer backend returning fixed pages.
#[derive(Default)]
struct StubExtractor {
    pages: Vec<(u32, String)>,
    metadata: SourceMetadata,
    failure: Option<String>,
}

impl StubExtractor {
    fn with_texts(texts: &[&str]) -> Self {
        Self {
            pages: texts
                .iter()
                .enumerate()
                .map(|(i, t)| (i as u32 + 1, t.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextExtractionBackend for StubExtractor {
    async fn extract(
        &self,
        _document: &SourceDocument,
    ) -> Result<Vec<ExtractedPage>, ExtractionError> {
        if let Some(reason) = &self.failure {
            return Err(ExtractionError::ExtractionFailed(reason.clone()));
        }
        Ok(self
            .pages
            .iter()
            .map(|(page_number, text)| ExtractedPage {
                page_number: *page_number,
                text: text.clone(),
                metadata: self.metadata.clone(),
            })
            .collect())
    }
}

/// Renderer producing a one-byte "image" per page.
struct StubRenderer {
    page_count: Result<u32, String>,
}

impl StubRenderer {
    fn pages(count: u32) -> Self {
        Self {
            page_count: Ok(count),
        }
    }
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn page_count(&self, _document: &SourceDocument) -> Result<u32, RenderError> {
        self.page_count.clone().map_err(RenderError::RenderFailed)
    }

    async fn render(
        &self,
        _document: &SourceDocument,
        page_number: u32,
    ) -> Result<RenderedImage, RenderError> {
        Ok(RenderedImage::png(page_number, vec![page_number as u8]))
    }
}

/// OCR backend with scripted per-page text, failures, and delays.
#[derive(Default)]
struct StubOcr {
    texts: HashMap<u32, String>,
    failures: HashSet<u32>,
    delays: HashMap<u32, Duration>,
    calls: Mutex<Vec<u32>>,
}

impl StubOcr {
    fn text(mut self, page_number: u32, text: &str) -> Self {
        self.texts.insert(page_number, text.to_string());
        self
    }

    fn fail(mut self, page_number: u32) -> Self {
        self.failures.insert(page_number);
        self
    }

    fn delay(mut self, page_number: u32, delay: Duration) -> Self {
        self.delays.insert(page_number, delay);
        self
    }

    fn called_pages(&self) -> Vec<u32> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }
}

#[async_trait]
impl OcrBackend for StubOcr {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    async fn recognize(
        &self,
        image: &RenderedImage,
        _language_hints: &[String],
    ) -> Result<String, OcrError> {
        let page_number = image.page_number;
        self.calls.lock().unwrap().push(page_number);

        if let Some(delay) = self.delays.get(&page_number) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&page_number) {
            return Err(OcrError::OcrFailed(format!("page {} unreadable", page_number)));
        }
        Ok(self.texts.get(&page_number).cloned().unwrap_or_default())
    }
}

fn source() -> SourceDocument {
    SourceDocument::with_mime_type("/tmp/report.pdf", "application/pdf")
}

fn options(threshold: usize) -> PipelineOptions {
    PipelineOptions {
        threshold,
        max_concurrency: 2,
        ..Default::default()
    }
}

fn pipeline(
    extractor: StubExtractor,
    renderer: StubRenderer,
    ocr: Arc<StubOcr>,
    options: PipelineOptions,
) -> DocumentPipeline {
    DocumentPipeline::new(Arc::new(extractor), Arc::new(renderer), ocr, options).unwrap()
}

#[tokio::test]
async fn test_all_pages_sufficient_skips_ocr() {
    let ocr = Arc::new(StubOcr::default());
    let pipeline = pipeline(
        StubExtractor::with_texts(&[LONG_PAGE_ONE, LONG_PAGE_THREE]),
        StubRenderer::pages(2),
        ocr.clone(),
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert!(ocr.called_pages().is_empty());
    assert_eq!(doc.body, format!("{}{}", LONG_PAGE_ONE, LONG_PAGE_THREE));
    assert!(doc.ocr_pages.is_empty());
    assert_eq!(doc.page_count, 2);
}

#[tokio::test]
async fn test_thin_page_replaced_by_ocr() {
    let ocr = Arc::new(StubOcr::default().text(2, "Recovered page two text"));
    let pipeline = pipeline(
        StubExtractor::with_texts(&[LONG_PAGE_ONE, "", LONG_PAGE_THREE]),
        StubRenderer::pages(3),
        ocr.clone(),
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(ocr.called_pages(), vec![2]);
    assert_eq!(
        doc.body,
        format!("{}Recovered page two text{}", LONG_PAGE_ONE, LONG_PAGE_THREE)
    );
    assert_eq!(doc.ocr_pages, vec![2]);
    assert_eq!(doc.page_count, 3);
}

#[tokio::test]
async fn test_mixed_document_keeps_longer_extracted_text() {
    let long_page = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(4);
    assert!(long_page.trim().chars().count() >= 200);

    let ocr = Arc::new(
        StubOcr::default()
            .text(2, "Recovered page two text")
            .text(3, "Sh"),
    );
    let pipeline = pipeline(
        StubExtractor::with_texts(&[long_page.as_str(), "", "Short"]),
        StubRenderer::pages(3),
        ocr.clone(),
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(ocr.called_pages(), vec![2, 3]);
    assert_eq!(
        doc.body,
        format!("{}Recovered page two textShort", long_page)
    );
    assert_eq!(doc.ocr_pages, vec![2]);
    assert_eq!(doc.page_count, 3);
}

#[test]
fn test_pipeline_rejects_invalid_options() {
    let result = DocumentPipeline::new(
        Arc::new(StubExtractor::default()),
        Arc::new(StubRenderer::pages(1)),
        Arc::new(StubOcr::default()),
        PipelineOptions {
            per_task_timeout: Duration::ZERO,
            ..options(50)
        },
    );

    assert!(matches!(
        result,
        Err(InvalidOptions {
            field: "per_task_timeout",
            ..
        })
    ));

    let result = DocumentPipeline::new(
        Arc::new(StubExtractor::default()),
        Arc::new(StubRenderer::pages(1)),
        Arc::new(StubOcr::default()),
        options(0),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_only_insufficient_pages_are_dispatched() {
    let ocr = Arc::new(StubOcr::default());
    let pipeline = pipeline(
        StubExtractor::with_texts(&["short", LONG_PAGE_ONE, "", "tiny", LONG_PAGE_THREE]),
        StubRenderer::pages(5),
        ocr.clone(),
        options(50),
    );

    let _ = pipeline.process(&source(), &SourceMetadata::default()).await;

    assert_eq!(ocr.called_pages(), vec![1, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_body_order_ignores_completion_order() {
    let ocr = Arc::new(
        StubOcr::default()
            .text(1, "one one one")
            .text(2, "two two two")
            .text(3, "three three")
            .delay(1, Duration::from_secs(30))
            .delay(2, Duration::from_secs(20))
            .delay(3, Duration::from_secs(10)),
    );
    let pipeline = pipeline(
        StubExtractor::with_texts(&["", "", ""]),
        StubRenderer::pages(3),
        ocr,
        PipelineOptions {
            max_concurrency: 3,
            ..options(50)
        },
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(doc.body, "one one onetwo two twothree three");
    assert_eq!(doc.ocr_pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_repeated_runs_produce_same_body() {
    let ocr = Arc::new(StubOcr::default().text(2, "Recovered page two text"));
    let pipeline = pipeline(
        StubExtractor::with_texts(&[LONG_PAGE_ONE, "", LONG_PAGE_THREE]),
        StubRenderer::pages(3),
        ocr,
        options(50),
    );

    let first = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();
    let second = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(first.body, second.body);
    assert_eq!(first.ocr_pages, second.ocr_pages);
    assert_eq!(first.word_count, second.word_count);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_failed_page_keeps_extracted_text() {
    let ocr = Arc::new(
        StubOcr::default()
            .text(1, "page one from ocr")
            .text(2, "page two from ocr")
            .text(4, "page four from ocr")
            .fail(3),
    );
    let pipeline = pipeline(
        StubExtractor::with_texts(&["a", "b", "c", "d"]),
        StubRenderer::pages(4),
        ocr,
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(
        doc.body,
        "page one from ocrpage two from ocrcpage four from ocr"
    );
    assert_eq!(doc.ocr_pages, vec![1, 2, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_page_keeps_extracted_text() {
    let ocr = Arc::new(
        StubOcr::default()
            .text(1, "quick ocr result")
            .text(2, "slow ocr result")
            .delay(2, Duration::from_secs(60)),
    );
    let pipeline = pipeline(
        StubExtractor::with_texts(&["x", "y"]),
        StubRenderer::pages(2),
        ocr,
        PipelineOptions {
            per_task_timeout: Duration::from_secs(5),
            ..options(50)
        },
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(doc.body, "quick ocr resulty");
    assert_eq!(doc.ocr_pages, vec![1]);
}

#[tokio::test]
async fn test_shorter_ocr_text_does_not_replace() {
    let ocr = Arc::new(StubOcr::default().text(1, "abc"));
    let pipeline = pipeline(
        StubExtractor::with_texts(&["abcdef"]),
        StubRenderer::pages(1),
        ocr,
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(doc.body, "abcdef");
    assert!(doc.ocr_pages.is_empty());
}

#[tokio::test]
async fn test_empty_content_is_an_error() {
    let ocr = Arc::new(StubOcr::default().text(1, "   "));
    let pipeline = pipeline(
        StubExtractor::with_texts(&["", " "]),
        StubRenderer::pages(2),
        ocr,
        options(50),
    );

    let err = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyContent(_)));
    assert_eq!(err.kind(), "empty_content");
    assert_eq!(err.document(), "report.pdf");
    assert_eq!(err.to_string(), "No text content found in report.pdf");
}

#[tokio::test]
async fn test_whole_document_fallback() {
    let ocr = Arc::new(
        StubOcr::default()
            .text(1, "scanned page one")
            .text(2, "scanned page two")
            .fail(3),
    );
    let pipeline = pipeline(
        StubExtractor::default(),
        StubRenderer::pages(3),
        ocr.clone(),
        options(50),
    );

    let doc = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();

    assert_eq!(ocr.called_pages(), vec![1, 2, 3]);
    assert_eq!(doc.body, "scanned page onescanned page two");
    assert_eq!(doc.ocr_pages, vec![1, 2]);
    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.title, "report.pdf");
}

#[tokio::test]
async fn test_whole_document_fallback_total_failure() {
    let ocr = Arc::new(StubOcr::default().fail(1).fail(2));
    let pipeline = pipeline(
        StubExtractor::default(),
        StubRenderer::pages(2),
        ocr,
        options(50),
    );

    let err = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::WholeDocumentOcr { .. }));
    assert_eq!(err.kind(), "whole_document_ocr_failure");
    assert_eq!(err.document(), "report.pdf");
}

#[tokio::test]
async fn test_whole_document_fallback_without_page_count() {
    let pipeline = pipeline(
        StubExtractor::default(),
        StubRenderer {
            page_count: Err("not a pdf".to_string()),
        },
        Arc::new(StubOcr::default()),
        options(50),
    );

    let err = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::WholeDocumentOcr { .. }));
}

#[tokio::test]
async fn test_extraction_failure() {
    let ocr = Arc::new(StubOcr::default());
    let pipeline = pipeline(
        StubExtractor {
            failure: Some("corrupt xref table".to_string()),
            ..Default::default()
        },
        StubRenderer::pages(1),
        ocr.clone(),
        options(50),
    );

    let err = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Extraction { .. }));
    assert_eq!(err.kind(), "extraction_failure");
    assert!(err.to_string().contains("corrupt xref table"));
    assert!(ocr.called_pages().is_empty());
}

#[tokio::test]
async fn test_gap_in_page_numbers_is_an_extraction_failure() {
    let extractor = StubExtractor {
        pages: vec![(1, LONG_PAGE_ONE.to_string()), (3, LONG_PAGE_THREE.to_string())],
        ..Default::default()
    };
    let pipeline = pipeline(
        extractor,
        StubRenderer::pages(3),
        Arc::new(StubOcr::default()),
        options(50),
    );

    let err = pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Extraction { .. }));
}

#[tokio::test]
async fn test_metadata_precedence() {
    let extractor = StubExtractor {
        metadata: SourceMetadata {
            title: Some("Embedded Title".to_string()),
            author: Some("Embedded Author".to_string()),
            ..Default::default()
        },
        ..StubExtractor::with_texts(&[LONG_PAGE_ONE])
    };
    let pipeline = pipeline(
        extractor,
        StubRenderer::pages(1),
        Arc::new(StubOcr::default()),
        options(50),
    );
    let overrides = SourceMetadata {
        title: Some("Caller Title".to_string()),
        ..Default::default()
    };

    let doc = pipeline.process(&source(), &overrides).await.unwrap();

    assert_eq!(doc.title, "Caller Title");
    assert_eq!(doc.author, "Embedded Author");
    assert_eq!(doc.description, "No description found.");
    assert_eq!(doc.source_descriptor, "document file uploaded by the user.");
}

#[tokio::test]
async fn test_progress_events() {
    let (tx, mut rx) = mpsc::channel(64);
    let pipeline = pipeline(
        StubExtractor::with_texts(&[LONG_PAGE_ONE, "", LONG_PAGE_THREE]),
        StubRenderer::pages(3),
        Arc::new(StubOcr::default().text(2, "Recovered page two text")),
        options(50),
    )
    .with_events(tx);

    pipeline
        .process(&source(), &SourceMetadata::default())
        .await
        .unwrap();
    drop(pipeline);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            PipelineEvent::ExtractionStarted {
                document: "report.pdf".to_string()
            },
            PipelineEvent::ExtractionCompleted {
                document: "report.pdf".to_string(),
                pages: 3
            },
            PipelineEvent::Classified {
                sufficient: 2,
                insufficient: 1
            },
            PipelineEvent::OcrStarted { total_pages: 1 },
            PipelineEvent::PageOcrFinished {
                page_number: 2,
                succeeded: true
            },
            PipelineEvent::OcrComplete {
                succeeded: 1,
                failed: 0
            },
            PipelineEvent::Merged {
                replaced: 1,
                failed: 0
            },
            PipelineEvent::DocumentAssembled {
                document: "report.pdf".to_string(),
                word_count: 32
            },
        ]
    );
}
