//! Text measurement helpers shared by classification, merge, and assembly.

/// Approximate number of characters per model token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Count characters after trimming leading and trailing whitespace.
///
/// This is the length used for both the sufficiency threshold and the
/// OCR replacement comparison, so the two decisions always agree.
pub fn trimmed_char_count(text: &str) -> usize {
    text.trim().chars().count()
}

/// Count whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Model-agnostic token estimate (one token per four characters, rounded up).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
