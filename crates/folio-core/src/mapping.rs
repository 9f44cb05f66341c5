//! Chapter boundary mapping.

/// Where a chapter begins, before its end is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub number: u32,
    pub filename: String,
    /// Line or page index the chapter starts at.
    pub start: usize,
}

/// A chapter's half-open `[start, end)` range of lines or pages.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterMapping {
    pub number: u32,
    pub filename: String,
    pub start: usize,
    pub end: usize,
}

impl ChapterMapping {
    /// Number of lines or pages in the chapter.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Close a list of anchors into ranges.
///
/// Each chapter ends where the next anchored chapter starts; the last one
/// ends at `total`. Anchors must already be in ascending `start` order.
pub fn close_ranges(anchors: Vec<Anchor>, total: usize) -> Vec<ChapterMapping> {
    let ends: Vec<usize> = anchors
        .iter()
        .skip(1)
        .map(|a| a.start)
        .chain(std::iter::once(total))
        .collect();
    anchors
        .into_iter()
        .zip(ends)
        .map(|(a, end)| ChapterMapping {
            number: a.number,
            filename: a.filename,
            start: a.start,
            end: end.max(a.start),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(number: u32, start: usize) -> Anchor {
        Anchor {
            number,
            filename: format!("{number:02}_x.md"),
            start,
        }
    }

    #[test]
    fn ranges_chain_to_total() {
        let m = close_ranges(vec![anchor(0, 0), anchor(1, 50), anchor(2, 90)], 120);
        let ranges: Vec<(usize, usize)> = m.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(0, 50), (50, 90), (90, 120)]);
        assert_eq!(m[1].len(), 40);
    }

    #[test]
    fn no_anchors_no_ranges() {
        assert!(close_ranges(Vec::new(), 10).is_empty());
    }

    #[test]
    fn single_anchor_runs_to_end() {
        let m = close_ranges(vec![anchor(4, 12)], 30);
        assert_eq!((m[0].start, m[0].end), (12, 30));
    }
}
