//! Final document assembly.

use chrono::Utc;
use thiserror::Error;

use crate::models::{Document, PageSet, SourceMetadata};
use crate::utils::{estimate_tokens, word_count};

pub const NO_AUTHOR: &str = "no author found";
pub const NO_DESCRIPTION: &str = "No description found.";
pub const DEFAULT_SOURCE: &str = "document file uploaded by the user.";

/// The assembled body had no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No text content found in {document}")]
pub struct EmptyContentError {
    pub document: String,
}

/// Inputs to assembly besides the pages themselves.
#[derive(Debug, Clone, Default)]
pub struct AssemblyMetadata {
    /// Name used in errors and as the last-resort title.
    pub document_name: String,
    /// Caller-supplied values; these win.
    pub overrides: SourceMetadata,
    /// Values reported by the extraction backend.
    pub backend: SourceMetadata,
    /// Pages whose text came from OCR.
    pub ocr_pages: Vec<u32>,
}

/// Concatenate pages in order and build the final `Document`.
///
/// Fails without producing anything if the body is empty or whitespace.
pub fn assemble(pages: &PageSet, metadata: AssemblyMetadata) -> Result<Document, EmptyContentError> {
    let body: String = pages.iter().map(|p| p.text.as_str()).collect();

    if body.trim().is_empty() {
        return Err(EmptyContentError {
            document: metadata.document_name,
        });
    }

    let AssemblyMetadata {
        document_name,
        overrides,
        backend,
        ocr_pages,
    } = metadata;
    let resolved = overrides.or(&backend);

    Ok(Document {
        id: uuid::Uuid::new_v4().to_string(),
        title: resolved.title.unwrap_or(document_name),
        author: resolved.author.unwrap_or_else(|| NO_AUTHOR.to_string()),
        description: resolved
            .description
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        source_descriptor: resolved.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        created_at: Utc::now(),
        word_count: word_count(&body),
        token_estimate: estimate_tokens(&body),
        page_count: pages.len(),
        ocr_pages,
        body,
    })
}
