//! folio-core: Backend-independent types and algorithms for folio.
//!
//! This crate holds the election logic that turns a book into a chapter
//! corpus: TOC cluster detection and election, body boundary scanning, page
//! anchoring, visual candidate extraction and caption alignment, plus the
//! geometry, text layout and SVG primitives they work on. It does no I/O.

pub mod anchor;
pub mod boundary;
pub mod caption;
pub mod election;
pub mod error;
pub mod geometry;
pub mod inject;
pub mod mapping;
pub mod naming;
pub mod path;
pub mod similarity;
pub mod svg;
pub mod text;
pub mod toc;
pub mod visual;

pub use anchor::{AnchorOptions, is_toc_page, resolve_page_anchors};
pub use boundary::{SplitOptions, SplitPlan, plan_split, refine_title, scan_body};
pub use caption::{
    AlignOptions, CaptionOccurrence, FigureBinding, FigureBindings, find_figure_ids,
    locate_caption, select_candidate,
};
pub use election::{cluster_score, elect_cluster};
pub use error::CorpusError;
pub use geometry::{BBox, Ctm, Point};
pub use inject::inject_figure_links;
pub use mapping::{Anchor, ChapterMapping};
pub use naming::{ChapterFile, FRONT_MATTER_FILENAME};
pub use path::{Color, PathObject, PathSegment};
pub use similarity::partial_ratio;
pub use svg::{RejectReason, SvgOptions, SvgRenderer, VectorExport, export_region};
pub use text::{Char, TextLayout};
pub use toc::{ChapterCandidate, TocCluster, detect_toc_clusters};
pub use visual::{CandidateOptions, VisualCandidate, VisualKind, extract_candidates};
