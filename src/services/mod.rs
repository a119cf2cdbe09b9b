//! Service layer for document processing logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by the CLI or embedded in other programs.

pub mod ocr;

pub use ocr::{DocumentPipeline, InvalidOptions, PipelineError, PipelineEvent, PipelineOptions};
