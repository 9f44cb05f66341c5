//! folio-raster: page-region rasterizer.
//!
//! Renders the placed images, painted paths and glyphs of a page region to
//! PNG with tiny-skia and fontdue. Used as the fallback when a figure cannot
//! be exported as SVG.

pub mod decode;
pub mod error;
pub mod render;
pub mod text;

pub use decode::decode_image;
pub use error::RasterError;
pub use render::{PlacedRaster, RasterOptions, Scene, render_region};
pub use text::{PlacedGlyph, load_font};
