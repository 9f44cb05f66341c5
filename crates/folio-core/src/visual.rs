//! Candidate visual regions on a page.
//!
//! Raster candidates are placed images. Vector candidates are clusters of
//! painted paths built by a single greedy pass in the page's painting
//! order: each path joins the first existing cluster whose box, grown by
//! the bridging margin, overlaps it, or starts a new cluster. The result
//! depends on that order, which is always the content stream order.

use crate::geometry::BBox;

/// Thresholds for candidate extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOptions {
    /// Images shorter than this are rules or watermarks.
    pub min_raster_height: f64,
    /// Paths narrower or shorter than this are ignored.
    pub min_path_size: f64,
    /// Margin added around a cluster when testing whether a path joins it.
    pub bridging_margin: f64,
    /// Clusters narrower than this are discarded.
    pub min_cluster_width: f64,
    /// Clusters shorter than this are discarded.
    pub min_cluster_height: f64,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            min_raster_height: 15.0,
            min_path_size: 5.0,
            bridging_margin: 50.0,
            min_cluster_width: 60.0,
            min_cluster_height: 40.0,
        }
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisualKind {
    Raster,
    Vector,
}

/// A region of a page that may be the visual behind a caption.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualCandidate {
    pub bbox: BBox,
    pub kind: VisualKind,
    pub area: f64,
}

impl VisualCandidate {
    pub fn new(bbox: BBox, kind: VisualKind) -> Self {
        Self {
            area: bbox.area(),
            bbox,
            kind,
        }
    }
}

/// Greedy single-pass merge of path boxes, in the order given.
///
/// Paths below `min_path_size` in either dimension are skipped. Returned
/// clusters are in creation order and are not size filtered.
pub fn merge_vector_clusters(path_boxes: &[BBox], options: &CandidateOptions) -> Vec<BBox> {
    let mut clusters: Vec<BBox> = Vec::new();
    for bbox in path_boxes {
        if bbox.width() < options.min_path_size || bbox.height() < options.min_path_size {
            continue;
        }
        match clusters
            .iter_mut()
            .find(|c| c.expand(options.bridging_margin).intersects(bbox))
        {
            Some(cluster) => *cluster = cluster.union(bbox),
            None => clusters.push(*bbox),
        }
    }
    clusters
}

/// All candidates on one page: raster images first, then vector clusters.
pub fn extract_candidates(
    image_boxes: &[BBox],
    path_boxes: &[BBox],
    options: &CandidateOptions,
) -> Vec<VisualCandidate> {
    let raster = image_boxes
        .iter()
        .filter(|b| b.height() >= options.min_raster_height)
        .map(|b| VisualCandidate::new(*b, VisualKind::Raster));

    let vector = merge_vector_clusters(path_boxes, options)
        .into_iter()
        .filter(|c| {
            c.width() >= options.min_cluster_width && c.height() >= options.min_cluster_height
        })
        .map(|c| VisualCandidate::new(c, VisualKind::Vector));

    raster.chain(vector).collect()
}
