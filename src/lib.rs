//! ocrmerge - per-page text layer / OCR decision and merge engine.
//!
//! Extracts the text layer of a multi-page document, decides page by page
//! whether that text is usable, OCRs the pages that aren't (with bounded
//! concurrency), and merges everything back into one ordered document body.

pub mod config;
pub mod models;
pub mod ocr;
pub mod services;
pub mod utils;

pub use config::Config;
pub use models::{Document, Page, PageSet, SourceDocument, SourceMetadata};
pub use services::{
    DocumentPipeline, InvalidOptions, PipelineError, PipelineEvent, PipelineOptions,
};
