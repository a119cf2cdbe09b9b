//! Source and assembled document models.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{detect_mime, document_kind, DocumentKind};

/// A document on disk waiting to be processed.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path to the file.
    pub path: PathBuf,
    /// MIME type of the content.
    pub mime_type: String,
}

impl SourceDocument {
    /// Create a source document, sniffing its MIME type from content.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = detect_mime(&path);
        Self { path, mime_type }
    }

    /// Create a source document with a known MIME type.
    pub fn with_mime_type(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Human-readable name used in logs and error messages.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn kind(&self) -> DocumentKind {
        document_kind(&self.mime_type)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Descriptive metadata for a document.
///
/// Used both for values reported by the extraction backend and for
/// caller-supplied overrides. Blank strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SourceMetadata {
    /// Fill any missing fields from `fallback`.
    pub fn or(self, fallback: &SourceMetadata) -> Self {
        Self {
            title: non_blank(self.title).or_else(|| non_blank(fallback.title.clone())),
            author: non_blank(self.author).or_else(|| non_blank(fallback.author.clone())),
            description: non_blank(self.description)
                .or_else(|| non_blank(fallback.description.clone())),
            source: non_blank(self.source).or_else(|| non_blank(fallback.source.clone())),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The final assembled document handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique ID (UUID v4).
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Where the document came from.
    pub source_descriptor: String,
    pub created_at: DateTime<Utc>,
    /// Page texts concatenated in page order.
    pub body: String,
    pub word_count: usize,
    pub token_estimate: usize,
    /// Number of pages in the reconciled page set.
    pub page_count: usize,
    /// Pages whose text came from OCR.
    pub ocr_pages: Vec<u32>,
}
