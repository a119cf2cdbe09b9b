//! MIME type detection and categorization for source documents.

use std::path::Path;

/// Broad document categories the pipeline knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// PDF with a (possibly empty) text layer.
    Pdf,
    /// Raster image; only reachable through OCR.
    Image,
    /// Plain text, read as a single page.
    Text,
    Other,
}

/// Categorize a MIME type into a document kind.
pub fn document_kind(mime: &str) -> DocumentKind {
    // Strip parameters like "; charset=utf-8"
    let mime_lower = mime
        .split(';')
        .next()
        .unwrap_or(mime)
        .trim()
        .to_lowercase();

    if mime_lower == "application/pdf" {
        DocumentKind::Pdf
    } else if mime_lower.starts_with("image/") {
        DocumentKind::Image
    } else if mime_lower == "text/plain" || mime_lower == "text/markdown" {
        DocumentKind::Text
    } else {
        DocumentKind::Other
    }
}

/// Detect a file's MIME type from its content, falling back to its extension.
pub fn detect_mime(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => return kind.mime_type().to_string(),
        Ok(None) => {}
        Err(e) => tracing::debug!("Could not sniff {}: {}", path.display(), e),
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
    .to_string()
}
