//! Per-page content models.
//!
//! A `PageSet` holds one entry per page in a fixed-size array where index
//! `page_number - 1` is the page's slot. Merging mutates slots in place and
//! assembly walks the array front to back, so output order never depends on
//! the order in which pages were produced.

use thiserror::Error;

use crate::utils::trimmed_char_count;

/// A single page of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed).
    pub page_number: u32,
    /// Current text for this page.
    pub text: String,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// Character count of the trimmed text.
    pub fn trimmed_len(&self) -> usize {
        trimmed_char_count(&self.text)
    }
}

/// Errors raised when pages don't form a valid 1..=N sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageSetError {
    #[error("Page numbers are 1-indexed, got page 0")]
    ZeroPageNumber,

    #[error("Duplicate page number: {0}")]
    DuplicatePage(u32),

    #[error("Page {missing} missing from range 1..={last}")]
    MissingPage { missing: u32, last: u32 },
}

/// Ordered, gap-free collection of pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    pages: Vec<Page>,
}

impl PageSet {
    /// Create an empty page set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a page set from pages in any order.
    ///
    /// Fails unless the page numbers are exactly `1..=N` with no repeats.
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Result<Self, PageSetError> {
        let mut pages: Vec<Page> = pages.into_iter().collect();
        pages.sort_by_key(|p| p.page_number);

        let last = pages.last().map(|p| p.page_number).unwrap_or(0);
        let mut previous = 0u32;
        for page in &pages {
            if page.page_number == 0 {
                return Err(PageSetError::ZeroPageNumber);
            }
            if page.page_number == previous {
                return Err(PageSetError::DuplicatePage(page.page_number));
            }
            if page.page_number != previous + 1 {
                return Err(PageSetError::MissingPage {
                    missing: previous + 1,
                    last,
                });
            }
            previous = page.page_number;
        }

        Ok(Self { pages })
    }

    /// Build a page set from texts in page order, numbering from 1.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .zip(1u32..)
            .map(|(text, page_number)| Page::new(page_number, text))
            .collect();
        Self { pages }
    }

    /// Build a page set of `count` empty pages.
    pub fn with_blank_pages(count: u32) -> Self {
        Self {
            pages: (1..=count).map(|n| Page::new(n, String::new())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Look up a page by its 1-indexed number.
    pub fn get(&self, page_number: u32) -> Option<&Page> {
        let index = (page_number as usize).checked_sub(1)?;
        self.pages.get(index)
    }

    /// Replace a page's text. Returns false if the page doesn't exist.
    pub fn set_text(&mut self, page_number: u32, text: String) -> bool {
        let Some(index) = (page_number as usize).checked_sub(1) else {
            return false;
        };
        match self.pages.get_mut(index) {
            Some(page) => {
                page.text = text;
                true
            }
            None => false,
        }
    }

    /// Iterate pages in ascending page order.
    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
