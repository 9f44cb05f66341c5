//! Fuzzy partial-match scoring between a short title and a longer text block.
//!
//! [`partial_ratio`] answers "how well does the shorter string appear somewhere
//! inside the longer one". Every alignment window of the longer string is
//! scored by matched characters, `2 * M / T`, where `M` is the longest common
//! subsequence with the shorter string and `T` the combined length. An
//! inserted or dropped character therefore costs one match, not two edits.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

/// Normalize text for comparison: NFKC, lowercase, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().flat_map(char::to_lowercase).collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-alignment similarity (0–100) between the shorter input and any
/// window of the longer input.
///
/// The windows are the prefixes shorter than the short side, every
/// full-length window, and the suffixes shorter than the short side.
/// Case-insensitive and whitespace-normalized. Returns 0 when either side is
/// empty after normalization.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if long.windows(short.len()).any(|w| w == short.as_slice()) {
        return 100;
    }

    let mut best = best_window_ratio(short, long);
    if short.len() == long.len() {
        best = best.max(best_window_ratio(long, short));
    }
    to_score(best)
}

/// Highest `2 * M / T` over the alignment windows of `needle` in `haystack`.
fn best_window_ratio(needle: &[char], haystack: &[char]) -> f64 {
    let m = needle.len();
    let n = haystack.len();
    let pattern = Pattern::new(needle);
    let mut best = 0.0_f64;

    let consider = |window: &[char], best: &mut f64| {
        // No window can beat 2 * min(m, w) / (m + w).
        let w = window.len();
        if 2.0 * m.min(w) as f64 / (m + w) as f64 <= *best {
            return;
        }
        let ratio = 2.0 * pattern.lcs(window) as f64 / (m + w) as f64;
        if ratio > *best {
            *best = ratio;
        }
    };

    // A window ending (or, for suffixes, starting) on a character absent
    // from the needle never scores above its trimmed neighbour.
    for end in 1..m {
        if pattern.contains(haystack[end - 1]) {
            consider(&haystack[..end], &mut best);
        }
    }
    for start in 0..=n - m {
        if pattern.contains(haystack[start + m - 1]) {
            consider(&haystack[start..start + m], &mut best);
        }
    }
    for start in n - m + 1..n {
        if pattern.contains(haystack[start]) {
            consider(&haystack[start..], &mut best);
        }
    }
    best
}

/// Per-character position bitmasks of a needle, for bit-parallel LCS.
struct Pattern {
    words: usize,
    masks: HashMap<char, Vec<u64>>,
}

impl Pattern {
    fn new(needle: &[char]) -> Self {
        let words = needle.len().div_ceil(64);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, &c) in needle.iter().enumerate() {
            masks.entry(c).or_insert_with(|| vec![0; words])[i / 64] |= 1 << (i % 64);
        }
        Self { words, masks }
    }

    fn contains(&self, c: char) -> bool {
        self.masks.contains_key(&c)
    }

    /// Length of the longest common subsequence of the needle and `text`.
    fn lcs(&self, text: &[char]) -> usize {
        // Each zero bit in `v` is one matched needle position.
        let mut v = vec![u64::MAX; self.words];
        for c in text {
            let Some(mask) = self.masks.get(c) else {
                continue;
            };
            let mut carry = false;
            for (word, &bits) in v.iter_mut().zip(mask) {
                let matched = *word & bits;
                let (sum, c1) = word.overflowing_add(matched);
                let (sum, c2) = sum.overflowing_add(u64::from(carry));
                carry = c1 || c2;
                *word = sum | (*word & !bits);
            }
        }
        v.iter().map(|word| word.count_zeros() as usize).sum()
    }
}

fn to_score(similarity: f64) -> u8 {
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}
