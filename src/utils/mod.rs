//! Shared utility functions.
//!
//! - `mime`: MIME detection and document categorization
//! - `text`: character, word, and token counting

mod mime;
pub mod text;

pub use mime::{detect_mime, document_kind, DocumentKind};
pub use text::{estimate_tokens, trimmed_char_count, word_count};
