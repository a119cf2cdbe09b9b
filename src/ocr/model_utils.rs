//! Shared helpers for the command-line tools behind the backends.

use std::process::Output;

use thiserror::Error;
use tokio::process::Command;

pub const PDFTOTEXT_NOT_FOUND: &str = "pdftotext (install poppler-utils)";
pub const PDFINFO_NOT_FOUND: &str = "pdfinfo (install poppler-utils)";
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm (install poppler-utils)";
pub const TESSERACT_NOT_FOUND: &str = "tesseract (install tesseract-ocr)";

/// Tools the default backends shell out to.
pub const REQUIRED_TOOLS: &[&str] = &["pdftotext", "pdfinfo", "pdftoppm", "tesseract"];

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("External tool not found: {0}")]
    NotFound(String),

    #[error("{tool} failed: {stderr}")]
    Failed { tool: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check availability of every tool the default backends need.
pub fn check_tools() -> Vec<(String, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

/// Run a command to completion and return its stdout.
///
/// The child is killed if the returned future is dropped, so wrapping this
/// in a timeout really stops the process.
pub async fn run_tool(command: &mut Command, not_found_hint: &str) -> Result<Vec<u8>, ToolError> {
    let result = command.kill_on_drop(true).output().await;
    handle_cmd_output(result, not_found_hint)
}

/// Extract stdout on success, or map the failure to a `ToolError`.
pub fn handle_cmd_output(
    result: std::io::Result<Output>,
    not_found_hint: &str,
) -> Result<Vec<u8>, ToolError> {
    match result {
        Ok(output) if output.status.success() => Ok(output.stdout),
        Ok(output) => Err(ToolError::Failed {
            tool: tool_name(not_found_hint).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ToolError::NotFound(not_found_hint.to_string()))
        }
        Err(e) => Err(ToolError::Io(e)),
    }
}

fn tool_name(hint: &str) -> &str {
    hint.split_whitespace().next().unwrap_or(hint)
}
