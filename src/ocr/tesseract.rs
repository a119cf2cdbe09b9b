//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction. The rendered
//! image is piped over stdin so nothing is written to disk.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::backend::{OcrBackend, OcrError};
use super::model_utils::{check_binary, handle_cmd_output, TESSERACT_NOT_FOUND};
use super::renderer::RenderedImage;

/// Language used when the caller supplies no hints.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Tesseract OCR backend.
pub struct TesseractBackend {
    binary: String,
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }
}

impl TesseractBackend {
    /// Create a new Tesseract backend using `tesseract` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tesseract binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build the `-l` argument: Tesseract combines languages with '+'.
    pub fn language_arg(language_hints: &[String]) -> Result<String, OcrError> {
        let mut langs = Vec::with_capacity(language_hints.len());
        for hint in language_hints {
            let hint = hint.trim();
            if hint.is_empty() {
                continue;
            }
            if !hint
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(OcrError::UnsupportedLanguage(hint.to_string()));
            }
            langs.push(hint);
        }

        if langs.is_empty() {
            Ok(DEFAULT_LANGUAGE.to_string())
        } else {
            Ok(langs.join("+"))
        }
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary)
    }

    fn availability_hint(&self) -> String {
        if !check_binary(&self.binary) {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    async fn recognize(
        &self,
        image: &RenderedImage,
        language_hints: &[String],
    ) -> Result<String, OcrError> {
        if image.is_empty() {
            return Err(OcrError::ImageError(format!(
                "empty image for page {}",
                image.page_number
            )));
        }

        let lang = Self::language_arg(language_hints)?;
        let start = Instant::now();

        let mut child = match Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()))
            }
            Err(e) => return Err(OcrError::Io(e)),
        };

        // Dropping stdin closes the pipe so tesseract sees EOF
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&image.bytes).await,
            None => Ok(()),
        };

        // A tesseract that quits early breaks the pipe; its stderr says why
        let output = handle_cmd_output(child.wait_with_output().await, TESSERACT_NOT_FOUND);
        let stdout = match (output, written) {
            (Ok(stdout), Ok(())) => stdout,
            (Err(e), _) => return Err(e.into()),
            (Ok(_), Err(e)) => return Err(OcrError::Io(e)),
        };
        tracing::debug!(
            "tesseract recognized page {} in {}ms",
            image.page_number,
            start.elapsed().as_millis()
        );

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
