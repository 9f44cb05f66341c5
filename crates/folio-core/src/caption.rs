//! Figure references, caption lookup and caption-to-visual alignment.

use std::sync::LazyLock;

use regex::Regex;

use crate::geometry::BBox;
use crate::text::{Char, TextLayout};
use crate::visual::{VisualCandidate, VisualKind};

static FIGURE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Figure|Fig\.?)\s*(\d+[.\-]\d+)").expect("valid figure regex")
});

/// Figure ids referenced in `text`, in order of appearance, repeats included.
pub fn find_figure_ids(text: &str) -> Vec<String> {
    FIGURE_REF_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

/// Pattern matching a reference to exactly `figure_id` (not `5.61` for `5.6`).
pub fn figure_reference_regex(figure_id: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)(?:Figure|Fig\.?)\s*{}\b", regex::escape(figure_id))).ok()
}

/// Where a figure's caption text sits on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOccurrence {
    pub figure_id: String,
    pub bbox: BBox,
}

/// Find the first on-page occurrence of `Figure <id>`, falling back to
/// `Fig. <id>`.
pub fn locate_caption(
    layout: &TextLayout,
    chars: &[Char],
    figure_id: &str,
) -> Option<CaptionOccurrence> {
    [format!("Figure {figure_id}"), format!("Fig. {figure_id}")]
        .iter()
        .find_map(|needle| layout.search_literal(chars, needle).into_iter().next())
        .map(|bbox| CaptionOccurrence {
            figure_id: figure_id.to_string(),
            bbox,
        })
}

/// Weights of the alignment score.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignOptions {
    pub vertical_weight: f64,
    pub horizontal_weight: f64,
    /// Multiplier for candidates that end above the caption center.
    pub above_bonus: f64,
    /// Candidates below this fraction of the page's largest area are penalized.
    pub small_area_fraction: f64,
    pub small_area_penalty: f64,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            vertical_weight: 1.0,
            horizontal_weight: 0.4,
            above_bonus: 0.5,
            small_area_fraction: 0.15,
            small_area_penalty: 100.0,
        }
    }
}

/// Distance-like score of `candidate` against a caption box. Lower is better.
pub fn score_candidate(
    caption: &BBox,
    candidate: &VisualCandidate,
    max_area: f64,
    options: &AlignOptions,
) -> f64 {
    let (cx, cy) = (caption.center_x(), caption.center_y());
    let mut score = options.vertical_weight * (cy - candidate.bbox.center_y()).abs()
        + options.horizontal_weight * (cx - candidate.bbox.center_x()).abs();
    if candidate.bbox.bottom < cy {
        score *= options.above_bonus;
    }
    if candidate.area < options.small_area_fraction * max_area {
        score *= options.small_area_penalty;
    }
    score
}

/// The best candidate for a caption, or `None` if the page has none.
///
/// Ties go to the earlier candidate.
pub fn select_candidate<'a>(
    caption: &CaptionOccurrence,
    candidates: &'a [VisualCandidate],
    options: &AlignOptions,
) -> Option<&'a VisualCandidate> {
    let max_area = candidates.iter().map(|c| c.area).fold(0.0, f64::max);
    let mut best: Option<(&VisualCandidate, f64)> = None;
    for candidate in candidates {
        let score = score_candidate(&caption.bbox, candidate, max_area, options);
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(c, _)| c)
}

/// A figure id bound to the asset extracted for it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FigureBinding {
    pub figure_id: String,
    /// Asset path relative to the output directory, e.g. `assets/fig_5_6.svg`.
    pub asset_path: String,
    pub kind: VisualKind,
    /// Zero-based page the visual was taken from.
    pub page: usize,
}

/// Ordered per-chapter figure bindings where the first binding of an id wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureBindings {
    entries: Vec<FigureBinding>,
}

impl FigureBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, figure_id: &str) -> bool {
        self.entries.iter().any(|b| b.figure_id == figure_id)
    }

    /// Add a binding unless the id is already bound. Returns whether it was added.
    pub fn insert(&mut self, binding: FigureBinding) -> bool {
        if self.contains(&binding.figure_id) {
            return false;
        }
        self.entries.push(binding);
        true
    }

    pub fn get(&self, figure_id: &str) -> Option<&FigureBinding> {
        self.entries.iter().find(|b| b.figure_id == figure_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FigureBinding> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<FigureBinding> {
        self.entries
    }
}
