//! Data models for the extraction and merge pipeline.

mod document;
mod page;

pub use document::{Document, SourceDocument, SourceMetadata};
pub use page::{Page, PageSet, PageSetError};
