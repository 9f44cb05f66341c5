//! folio-parse: PDF parsing backend and content stream interpreter.
//!
//! Loads documents with lopdf and interprets page content streams into
//! positioned glyphs, painted paths and placed images, all in top-left
//! page coordinates. It depends on folio-core for shared data types.

pub mod cmap;
pub mod document;
pub mod error;
pub mod fonts;
pub mod handler;
pub mod interpreter;
mod objects;
pub mod state;

pub use document::{ImageData, ImageEncoding, PageContent, PdfDocument};
pub use error::BackendError;
pub use folio_core;
pub use handler::{CharEvent, ContentHandler, GlyphPaint, ImageEvent, PageCollector};
pub use interpreter::ExtractOptions;
pub use lopdf::ObjectId;
