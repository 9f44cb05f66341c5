//! Page text assembly and positioned literal search.
//!
//! Glyphs come out of the content stream in painting order. [`TextLayout`]
//! groups them into lines by baseline, inserts synthetic spaces at visual
//! gaps, and remembers which glyph produced every byte of the assembled
//! string so that search hits can be mapped back to page coordinates.

use regex::Regex;

use crate::geometry::BBox;

/// Gap between glyphs, as a fraction of font size, that reads as a space.
const SPACE_GAP_RATIO: f64 = 0.15;

/// Baseline shift, as a fraction of font size, that starts a new line.
const LINE_SHIFT_RATIO: f64 = 0.5;

/// A single rendered glyph with its position on the page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Char {
    /// Unicode text of the glyph (may be more than one char for ligatures).
    pub text: String,
    /// Glyph box in top-left page coordinates.
    pub bbox: BBox,
    /// Effective font size in page units.
    pub size: f64,
}

/// Assembled page text with a byte → glyph index map.
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    text: String,
    /// For each byte of `text`, the glyph it came from (`None` for synthetic separators).
    byte_to_char: Vec<Option<usize>>,
}

impl TextLayout {
    /// Assemble the glyphs of one page into reading text.
    pub fn from_chars(chars: &[Char]) -> Self {
        let mut layout = TextLayout::default();
        let mut prev: Option<&Char> = None;

        for (idx, ch) in chars.iter().enumerate() {
            if ch.text.is_empty() {
                continue;
            }
            if let Some(p) = prev {
                let size = p.size.max(ch.size).max(1.0);
                let new_line = (ch.bbox.bottom - p.bbox.bottom).abs() > size * LINE_SHIFT_RATIO
                    || ch.bbox.x0 < p.bbox.x0 - size;
                if new_line {
                    layout.push_separator('\n');
                } else {
                    let gap = ch.bbox.x0 - p.bbox.x1;
                    let already_spaced = p.text.ends_with(char::is_whitespace)
                        || ch.text.starts_with(char::is_whitespace);
                    if gap > size * SPACE_GAP_RATIO && !already_spaced {
                        layout.push_separator(' ');
                    }
                }
            }
            layout.text.push_str(&ch.text);
            layout
                .byte_to_char
                .extend(std::iter::repeat_n(Some(idx), ch.text.len()));
            prev = Some(ch);
        }

        layout
    }

    fn push_separator(&mut self, sep: char) {
        self.text.push(sep);
        self.byte_to_char.push(None);
    }

    /// The assembled text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Case-insensitive literal search. Whitespace in `needle` matches any
    /// whitespace run in the page text.
    ///
    /// Returns the union bounding box of the glyphs behind each hit, in
    /// document order.
    pub fn search_literal(&self, chars: &[Char], needle: &str) -> Vec<BBox> {
        let parts: Vec<String> = needle.split_whitespace().map(regex::escape).collect();
        if parts.is_empty() {
            return Vec::new();
        }
        let re = match Regex::new(&format!("(?i){}", parts.join(r"\s+"))) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };

        let mut results = Vec::new();
        for m in re.find_iter(&self.text) {
            let mut bbox: Option<BBox> = None;
            let mut last_idx = None;
            for byte in m.start()..m.end() {
                let Some(Some(idx)) = self.byte_to_char.get(byte).copied() else {
                    continue;
                };
                if last_idx == Some(idx) {
                    continue;
                }
                last_idx = Some(idx);
                if let Some(ch) = chars.get(idx) {
                    bbox = Some(match bbox {
                        Some(b) => b.union(&ch.bbox),
                        None => ch.bbox,
                    });
                }
            }
            if let Some(b) = bbox {
                results.push(b);
            }
        }
        results
    }
}
