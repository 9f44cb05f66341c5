//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter calls [`ContentHandler`] methods as it processes page
//! content. Events already carry top-left page coordinates, so handlers do
//! no geometry of their own.

use folio_core::{BBox, Char, Color, PathObject};
use lopdf::ObjectId;

/// How a glyph was painted, enough to rasterize it again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPaint {
    /// Glyph index in `font_program`, for fonts that address glyphs by CID.
    pub glyph_id: Option<u16>,
    /// Embedded TrueType or OpenType program of the font.
    pub font_program: Option<ObjectId>,
    pub color: Color,
    /// False in the invisible and clip-only rendering modes.
    pub visible: bool,
}

/// A rendered character glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct CharEvent {
    /// Unicode text for the code.
    pub text: String,
    /// Effective font size on the page.
    pub size: f64,
    /// Glyph box in page coordinates.
    pub bbox: BBox,
    pub paint: GlyphPaint,
}

/// A placed image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEvent {
    /// XObject resource name (e.g. "Im0").
    pub name: String,
    /// Indirect object id of the image stream, used to fetch its samples.
    pub object_id: Option<ObjectId>,
    /// Unit square mapped through the CTM.
    pub bbox: BBox,
}

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, allowing handlers to
/// subscribe only to the event types they care about.
pub trait ContentHandler {
    /// Called when a character glyph is rendered.
    fn on_char(&mut self, _event: CharEvent) {}

    /// Called when a path is painted (stroked, filled, or both).
    fn on_path_painted(&mut self, _path: PathObject) {}

    /// Called when an image XObject is placed on the page.
    fn on_image(&mut self, _event: ImageEvent) {}

    /// Called when the interpreter recovers from a problem and continues.
    fn on_warning(&mut self, _message: String) {}
}

/// Collects every event of one page.
#[derive(Debug, Default)]
pub struct PageCollector {
    pub chars: Vec<Char>,
    /// Paint of each glyph, aligned with `chars`.
    pub glyphs: Vec<GlyphPaint>,
    pub paths: Vec<PathObject>,
    pub images: Vec<ImageEvent>,
    pub warnings: Vec<String>,
}

impl ContentHandler for PageCollector {
    fn on_char(&mut self, event: CharEvent) {
        self.chars.push(Char {
            text: event.text,
            bbox: event.bbox,
            size: event.size,
        });
        self.glyphs.push(event.paint);
    }

    fn on_path_painted(&mut self, path: PathObject) {
        self.paths.push(path);
    }

    fn on_image(&mut self, event: ImageEvent) {
        self.images.push(event);
    }

    fn on_warning(&mut self, message: String) {
        #[cfg(feature = "tracing")]
        tracing::warn!(%message, "content stream warning");
        self.warnings.push(message);
    }
}
