//! Reconciliation of extracted text with OCR output.
//!
//! OCR text replaces a page's extracted text only when the page was flagged
//! insufficient, the OCR call succeeded, and the OCR text is strictly longer
//! (trimmed) than what was extracted. Length is the only quality signal, so
//! long but garbled OCR output still wins.

use std::collections::HashSet;

use super::types::{OcrOutcome, QualityVerdict};
use crate::models::PageSet;
use crate::utils::trimmed_char_count;

/// Result of merging OCR outcomes into a page set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Final pages, in page order.
    pub pages: PageSet,
    /// Pages whose text now comes from OCR, ascending.
    pub replaced: Vec<u32>,
    /// Pages whose OCR call failed, ascending.
    pub failed: Vec<u32>,
}

/// Failure of the whole-document OCR path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackFailure {
    pub reason: String,
}

/// Whether OCR text should replace the original.
pub fn ocr_wins(original: &str, ocr: &str) -> bool {
    trimmed_char_count(ocr) > trimmed_char_count(original)
}

/// Merge OCR outcomes into the extracted pages.
///
/// Only pages with an insufficient verdict are eligible for replacement.
pub fn reconcile(
    original: PageSet,
    verdicts: &[QualityVerdict],
    outcomes: Vec<OcrOutcome>,
) -> Reconciliation {
    let eligible: HashSet<u32> = verdicts
        .iter()
        .filter(|v| !v.sufficient)
        .map(|v| v.page_number)
        .collect();

    let mut pages = original;
    let mut replaced = Vec::new();
    let mut failed = Vec::new();

    for outcome in outcomes {
        let page_number = outcome.page_number;

        if !eligible.contains(&page_number) {
            tracing::warn!(
                "Ignoring OCR result for page {} which was not flagged for OCR",
                page_number
            );
            continue;
        }
        if !outcome.succeeded {
            failed.push(page_number);
            continue;
        }

        let Some(page) = pages.get(page_number) else {
            tracing::warn!("Ignoring OCR result for unknown page {}", page_number);
            continue;
        };

        if ocr_wins(&page.text, &outcome.text) {
            tracing::debug!(
                "Page {}: OCR text ({} chars) replaces extracted text ({} chars)",
                page_number,
                trimmed_char_count(&outcome.text),
                page.trimmed_len()
            );
            pages.set_text(page_number, outcome.text);
            replaced.push(page_number);
        } else {
            tracing::debug!("Page {}: keeping extracted text", page_number);
        }
    }

    replaced.sort_unstable();
    failed.sort_unstable();

    Reconciliation {
        pages,
        replaced,
        failed,
    }
}

/// Build the final page set for a document that had no text layer.
///
/// Every page came from OCR, so there is nothing to compare against.
/// Failed pages are left blank; if no page succeeded the document fails.
pub fn from_fallback(
    page_count: u32,
    outcomes: Vec<OcrOutcome>,
) -> Result<Reconciliation, FallbackFailure> {
    if page_count == 0 {
        return Err(FallbackFailure {
            reason: "document has no pages to OCR".to_string(),
        });
    }

    let mut pages = PageSet::with_blank_pages(page_count);
    let mut replaced = Vec::new();
    let mut failed = Vec::new();
    let mut last_error = None;

    for outcome in outcomes {
        if !outcome.succeeded {
            failed.push(outcome.page_number);
            last_error = outcome.error_reason;
            continue;
        }
        if pages.set_text(outcome.page_number, outcome.text) {
            replaced.push(outcome.page_number);
        } else {
            tracing::warn!("Ignoring OCR result for unknown page {}", outcome.page_number);
        }
    }

    if replaced.is_empty() {
        return Err(FallbackFailure {
            reason: last_error.unwrap_or_else(|| "no OCR results".to_string()),
        });
    }

    replaced.sort_unstable();
    failed.sort_unstable();

    Ok(Reconciliation {
        pages,
        replaced,
        failed,
    })
}
