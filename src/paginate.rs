//! Pagination: slicing an ordered page list into fixed-size listing pages.
//!
//! Each slice carries the navigation metadata a template needs to render
//! prev/next links and a page-number strip. Page 1 is special: its
//! canonical URL is the collection's own index and never carries a numeric
//! suffix, while pages 2 and up live under `page/<n>`. [`PageUrls`] encodes
//! that split so the slicing math stays URL-scheme agnostic.

use crate::types::Page;

/// URL scheme for a paginated collection.
#[derive(Debug, Clone)]
pub struct PageUrls {
    /// Canonical URL of page 1 (the collection's index).
    pub index: String,
    /// URL template for pages 2 and up; `{n}` is replaced with the page
    /// number.
    pub numbered: String,
}

impl PageUrls {
    pub fn url_for(&self, number: usize) -> String {
        if number == 1 {
            self.index.clone()
        } else {
            self.numbered.replace("{n}", &number.to_string())
        }
    }
}

/// Navigation metadata for one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    /// Full ascending page-number list for rendering page-link controls.
    pub page_numbers: Vec<usize>,
}

/// One page-sized slice of a collection.
#[derive(Debug, Clone)]
pub struct PaginatedPage {
    /// 1-based page number.
    pub number: usize,
    pub items: Vec<Page>,
    pub pagination: Pagination,
}

/// Splits `pages` into consecutive chunks of `page_size` (the last chunk
/// may be shorter). Page 1 always exists, even for an empty input.
pub fn paginate(pages: &[Page], page_size: usize, urls: &PageUrls) -> Vec<PaginatedPage> {
    let page_size = page_size.max(1);
    let total_pages = pages.len().div_ceil(page_size).max(1);
    let page_numbers: Vec<usize> = (1..=total_pages).collect();

    let mut chunks: Vec<&[Page]> = pages.chunks(page_size).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let number = i + 1;
            let has_prev = number > 1;
            let has_next = number < total_pages;
            PaginatedPage {
                number,
                items: chunk.to_vec(),
                pagination: Pagination {
                    current_page: number,
                    total_pages,
                    has_prev,
                    has_next,
                    prev_url: has_prev.then(|| urls.url_for(number - 1)),
                    next_url: has_next.then(|| urls.url_for(number + 1)),
                    page_numbers: page_numbers.clone(),
                },
            }
        })
        .collect()
}

/// A collection rendered as one page, with no prev/next navigation.
pub fn single_page(pages: &[Page]) -> PaginatedPage {
    PaginatedPage {
        number: 1,
        items: pages.to_vec(),
        pagination: Pagination {
            current_page: 1,
            total_pages: 1,
            has_prev: false,
            has_next: false,
            prev_url: None,
            next_url: None,
            page_numbers: vec![1],
        },
    }
}
