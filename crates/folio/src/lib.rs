//! folio: Turn a converted book into a chapter corpus with its figures.
//!
//! This is the public API facade crate. It re-exports the core types and
//! drives the two pipelines end to end:
//!
//! - [`ChapterSplitter`] elects the book's table of contents, finds each
//!   chapter heading in the body and writes one markdown file per chapter.
//! - [`VisualInjector`] anchors those chapter files to pages of the source
//!   PDF, binds figure captions to the visuals drawn near them, exports each
//!   visual as SVG (or PNG when vector export is not possible) and links
//!   the assets into the chapter markdown.
//!
//! # Architecture
//!
//! - **folio-core**: Backend-independent types and election algorithms
//! - **folio-parse**: PDF loading and content stream interpretation
//! - **folio-raster**: Region rasterization for the PNG fallback
//! - **folio** (this crate): File I/O and orchestration

pub mod injector;
pub mod splitter;

pub use folio_core;
pub use folio_parse;
pub use folio_raster;

pub use folio_core::{
    AlignOptions, AnchorOptions, CandidateOptions, ChapterMapping, CorpusError, FigureBinding,
    SplitOptions, VisualKind,
};
pub use folio_parse::ExtractOptions;
pub use folio_raster::RasterOptions;
pub use injector::{ASSETS_DIR, ChapterReport, InjectOptions, InjectReport, VisualInjector};
pub use splitter::{ChapterSplitter, SplitReport};
