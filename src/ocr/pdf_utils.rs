//! Poppler helpers shared by the PDF extractor and renderer.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::model_utils::{run_tool, ToolError, PDFINFO_NOT_FOUND};

/// Document-level facts reported by `pdfinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub pages: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Run `pdfinfo` on a file.
pub async fn pdf_info(path: &Path) -> Result<PdfInfo, ToolError> {
    let stdout = run_tool(Command::new("pdfinfo").arg(path), PDFINFO_NOT_FOUND).await?;
    Ok(parse_pdf_info(&String::from_utf8_lossy(&stdout)))
}

/// Parse `pdfinfo` output. Unknown or malformed lines are ignored.
pub fn parse_pdf_info(output: &str) -> PdfInfo {
    let mut info = PdfInfo::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Pages" => info.pages = value.parse().unwrap_or(0),
            "Title" if !value.is_empty() => info.title = Some(value.to_string()),
            "Author" if !value.is_empty() => info.author = Some(value.to_string()),
            "Subject" if !value.is_empty() => info.subject = Some(value.to_string()),
            _ => {}
        }
    }

    info
}

/// Find the image file for a specific page number.
///
/// pdftoppm names files like page-01.png, page-02.png, etc.
/// The padding width varies based on total page count.
pub fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4, 5] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = temp_path.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Split `pdftotext` output into per-page texts.
///
/// Pages are separated by form feeds; pdftotext also terminates the last
/// page with one, which produces a trailing empty segment.
pub fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\u{c}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
