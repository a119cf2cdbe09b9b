//! Content quality classification.

use super::types::QualityVerdict;
use crate::models::PageSet;

/// Default minimum trimmed characters for a page to skip OCR.
pub const DEFAULT_THRESHOLD: usize = 50;

/// Tag every page as sufficient (trimmed length >= threshold) or not.
pub fn classify(pages: &PageSet, threshold: usize) -> Vec<QualityVerdict> {
    pages
        .iter()
        .map(|page| QualityVerdict {
            page_number: page.page_number,
            sufficient: page.trimmed_len() >= threshold,
        })
        .collect()
}

/// Page numbers that need OCR, ascending.
pub fn insufficient_pages(verdicts: &[QualityVerdict]) -> Vec<u32> {
    verdicts
        .iter()
        .filter(|v| !v.sufficient)
        .map(|v| v.page_number)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let pages = PageSet::from_texts(["a".repeat(49), "a".repeat(50), "a".repeat(51)]);
        let verdicts = classify(&pages, 50);
        let flags: Vec<bool> = verdicts.iter().map(|v| v.sufficient).collect();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let padded = format!("   {}   \n\n", "x".repeat(10));
        let pages = PageSet::from_texts([padded]);
        assert!(!classify(&pages, 11)[0].sufficient);
        assert!(classify(&pages, 10)[0].sufficient);
    }

    #[test]
    fn test_insufficient_pages() {
        let lorem = "L".repeat(200);
        let pages = PageSet::from_texts([lorem.as_str(), "", "Short"]);
        let verdicts = classify(&pages, DEFAULT_THRESHOLD);
        assert_eq!(insufficient_pages(&verdicts), vec![2, 3]);
    }

    #[test]
    fn test_all_sufficient_yields_nothing_to_ocr() {
        let pages = PageSet::from_texts(["long enough text", "also long enough"]);
        let verdicts = classify(&pages, 5);
        assert!(insufficient_pages(&verdicts).is_empty());
    }

    #[test]
    fn test_empty_page_set() {
        assert!(classify(&PageSet::new(), DEFAULT_THRESHOLD).is_empty());
    }
}
