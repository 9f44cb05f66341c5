//! Anchoring chapters to physical PDF pages.
//!
//! Each chapter is searched for page by page, starting a little after the
//! previous anchor. Pages that also resemble titles of *later* chapters are
//! treated as a table of contents or part-intro listing and skipped.

use crate::mapping::{Anchor, ChapterMapping, close_ranges};
use crate::naming::ChapterFile;
use crate::similarity::partial_ratio;

/// Options for page anchoring.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorOptions {
    /// A page must score strictly above this to anchor a chapter.
    pub threshold: u8,
    /// A later chapter scoring strictly above this marks the page as a listing.
    pub toc_reject_threshold: u8,
    /// Pages before this index are never searched.
    pub min_start_page: usize,
    /// Fraction of the page count skipped at the start of the document.
    pub start_fraction: f64,
    /// Pages skipped after an anchor before searching for the next chapter.
    pub min_gap_after_anchor: usize,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            threshold: 85,
            toc_reject_threshold: 80,
            min_start_page: 10,
            start_fraction: 0.03,
            min_gap_after_anchor: 3,
        }
    }
}

/// Whether `page_text` looks like a listing of chapters after `current`.
pub fn is_toc_page(
    page_text: &str,
    current: &ChapterFile,
    chapters: &[ChapterFile],
    reject_threshold: u8,
) -> bool {
    chapters
        .iter()
        .filter(|other| other.number > current.number)
        .any(|other| partial_ratio(&other.title_hint, page_text) > reject_threshold)
}

/// First page index searched for any chapter.
pub fn search_floor(total_pages: usize, options: &AnchorOptions) -> usize {
    let fraction = (total_pages as f64 * options.start_fraction).floor() as usize;
    fraction.max(options.min_start_page)
}

/// Anchor `chapters`, in the order given, to pages of a document whose
/// lower-cased page texts are `page_texts`.
///
/// Chapters that cannot be anchored are left out; the returned ranges are
/// in ascending page order and the last one ends at the page count.
pub fn resolve_page_anchors<S: AsRef<str>>(
    chapters: &[ChapterFile],
    page_texts: &[S],
    options: &AnchorOptions,
) -> Vec<ChapterMapping> {
    let total = page_texts.len();
    let floor = search_floor(total, options);
    let mut next_start = 0;
    let mut anchors = Vec::new();

    for chapter in chapters {
        let found = (next_start.max(floor)..total).find(|&idx| {
            let text = page_texts[idx].as_ref();
            partial_ratio(&chapter.title_hint, text) > options.threshold
                && !is_toc_page(text, chapter, chapters, options.toc_reject_threshold)
        });
        if let Some(page) = found {
            anchors.push(Anchor {
                number: chapter.number,
                filename: chapter.filename.clone(),
                start: page,
            });
            next_start = page + options.min_gap_after_anchor;
        }
    }

    close_ranges(anchors, total)
}
