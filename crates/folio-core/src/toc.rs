//! Table-of-contents cluster detection.
//!
//! Every line that looks like `Chapter <n><sep><title>` becomes a
//! [`ChapterCandidate`]. Candidates that sit close together (within
//! `toc_gap` lines of the previous one) form a [`TocCluster`]; a real table
//! of contents shows up as one dense cluster while scattered body headings
//! and running headers form many short ones.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Chapter\s+(\d+)[:\-\s,]+(.*)").expect("valid heading regex")
});

/// Trailing page number after a comma, a dot leader or a wide gap.
static PAGE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s*,\s*|\s*(?:\.\s*){2,}|\s*\.\s+|\s+\.\s*|\s{2,})\d+$")
        .expect("valid page suffix regex")
});

/// A line that looks like a chapter heading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterCandidate {
    /// Chapter number as written.
    pub number: u32,
    /// Title text following the number, page-number suffix removed.
    pub title_hint: String,
    /// Zero-based line (or page) index the candidate was found at.
    pub position: usize,
    /// The trimmed source line.
    pub raw_text: String,
}

impl ChapterCandidate {
    /// Parse a single line. Returns `None` if it is not a chapter heading.
    pub fn from_line(line: &str, position: usize) -> Option<Self> {
        let clean = line.trim();
        let caps = HEADING_RE.captures(clean)?;
        let number = caps.get(1)?.as_str().parse().ok()?;
        let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
        Some(ChapterCandidate {
            number,
            title_hint: strip_page_suffix(rest).to_string(),
            position,
            raw_text: clean.to_string(),
        })
    }
}

/// Remove a trailing `, 12` / `..... 12` / `   12` page reference.
pub fn strip_page_suffix(hint: &str) -> &str {
    match PAGE_SUFFIX_RE.find(hint) {
        Some(m) => hint[..m.start()].trim_end(),
        None => hint,
    }
}

/// A run of chapter candidates found close together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TocCluster {
    pub candidates: Vec<ChapterCandidate>,
}

impl TocCluster {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn first(&self) -> Option<&ChapterCandidate> {
        self.candidates.first()
    }

    pub fn last(&self) -> Option<&ChapterCandidate> {
        self.candidates.last()
    }

    /// Adjacent pairs whose numbers increase by exactly one.
    pub fn sequential_pairs(&self) -> usize {
        self.candidates
            .windows(2)
            .filter(|w| w[0].number.checked_add(1) == Some(w[1].number))
            .count()
    }
}

/// Scan `lines` and group every chapter-heading line into proximity clusters.
///
/// A candidate more than `toc_gap` lines after the previous candidate closes
/// the current cluster. Clusters come back in document order and together
/// hold every candidate exactly once.
pub fn detect_toc_clusters<S: AsRef<str>>(lines: &[S], toc_gap: usize) -> Vec<TocCluster> {
    let mut clusters = Vec::new();
    let mut current = TocCluster::default();
    let mut last_position: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        let Some(candidate) = ChapterCandidate::from_line(line.as_ref(), idx) else {
            continue;
        };
        if let Some(last) = last_position {
            if idx - last > toc_gap && !current.is_empty() {
                clusters.push(std::mem::take(&mut current));
            }
        }
        current.candidates.push(candidate);
        last_position = Some(idx);
    }

    if !current.is_empty() {
        clusters.push(current);
    }
    clusters
}
