//! Body boundary scanning for raw text.
//!
//! After the elected table of contents, the body is walked line by line
//! looking for the heading of the next expected chapter, either by its
//! number (`# Chapter 3`) or by a fuzzy match of a heading line against the
//! TOC title. Chapters never found are skipped and their text stays with
//! the previous chapter.

use std::sync::LazyLock;

use regex::Regex;

use crate::election::elect_cluster;
use crate::error::CorpusError;
use crate::mapping::{Anchor, ChapterMapping, close_ranges};
use crate::naming::{FRONT_MATTER_FILENAME, chapter_filename};
use crate::similarity::partial_ratio;
use crate::toc::{ChapterCandidate, TocCluster, detect_toc_clusters};

static HEADING_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[#\s*]+").expect("valid heading marker regex"));

/// Options for splitting raw text into chapters.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Maximum line distance between two TOC entries of the same cluster.
    pub toc_gap: usize,
    /// Minimum similarity (inclusive) for a fuzzy heading match.
    pub threshold: u8,
    /// Maximum length of the sanitized title in a file name.
    pub max_name_len: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            toc_gap: 10,
            threshold: 85,
            max_name_len: 80,
        }
    }
}

/// Result of planning a split: the elected TOC and the chapter ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub elected: TocCluster,
    /// Line ranges in ascending order, front matter first.
    pub chapters: Vec<ChapterMapping>,
}

/// Refine a chapter title from the body heading that matched it.
///
/// Strips heading markers and a leading `Chapter <number>` prefix, then
/// drops a trailing ` , description` clause. Returns `None` when fewer than
/// three characters remain.
pub fn refine_title(body_line: &str, number: u32) -> Option<String> {
    let clean = HEADING_MARKER_RE.replace(body_line.trim(), "");
    let clean = clean.trim();
    let prefix = Regex::new(&format!(r"(?i)^Chapter\s+{number}[:\-\s,]*")).ok()?;
    let clean = prefix.replace(clean, "");
    let clean = clean.trim();
    if clean.chars().count() < 3 {
        return None;
    }
    let title = match clean.split_once(" , ") {
        Some((head, _)) => head,
        None => clean,
    };
    Some(title.trim().to_string())
}

/// Walk `lines` after the elected TOC and anchor each expected chapter.
///
/// The returned anchors always start with the front matter at line 0.
pub fn scan_body<S: AsRef<str>>(
    lines: &[S],
    elected: &TocCluster,
    options: &SplitOptions,
) -> Vec<Anchor> {
    let mut anchors = vec![Anchor {
        number: 0,
        filename: FRONT_MATTER_FILENAME.to_string(),
        start: 0,
    }];
    let Some(last) = elected.last() else {
        return anchors;
    };

    let mut expected = 0;
    let mut exact = exact_heading_re(&elected.candidates[0]);
    for (idx, line) in lines.iter().enumerate().skip(last.position + 1) {
        let Some(target) = elected.candidates.get(expected) else {
            break;
        };
        let clean = line.as_ref().trim();
        if !is_heading_match(clean, target, exact.as_ref(), options.threshold) {
            continue;
        }

        let title = refine_title(clean, target.number).unwrap_or_else(|| target.title_hint.clone());
        anchors.push(Anchor {
            number: target.number,
            filename: chapter_filename(target.number, &title, options.max_name_len),
            start: idx,
        });
        expected += 1;
        if let Some(next) = elected.candidates.get(expected) {
            exact = exact_heading_re(next);
        }
    }
    anchors
}

fn exact_heading_re(target: &ChapterCandidate) -> Option<Regex> {
    Regex::new(&format!(r"(?i)^#+\s*Chapter\s+{}\b", target.number)).ok()
}

fn is_heading_match(
    clean: &str,
    target: &ChapterCandidate,
    exact: Option<&Regex>,
    threshold: u8,
) -> bool {
    if exact.is_some_and(|re| re.is_match(clean)) {
        return true;
    }
    if !clean.starts_with('#') {
        return false;
    }
    let body = HEADING_MARKER_RE.replace(clean, "");
    partial_ratio(&target.title_hint, body.trim()) >= threshold
}

/// Detect, elect and scan: the full text split plan for `lines`.
pub fn plan_split<S: AsRef<str>>(
    lines: &[S],
    options: &SplitOptions,
) -> Result<SplitPlan, CorpusError> {
    let clusters = detect_toc_clusters(lines, options.toc_gap);
    let elected = elect_cluster(&clusters)?.clone();
    let anchors = scan_body(lines, &elected, options);
    Ok(SplitPlan {
        chapters: close_ranges(anchors, lines.len()),
        elected,
    })
}
