//! Glyph rasterization with fontdue.
//!
//! Glyphs are drawn from the page's embedded TrueType or OpenType program
//! when one was loaded into the [`Scene`](crate::Scene), and from a bundled
//! DejaVu Sans face otherwise. Placement uses the extracted glyph box only:
//! the left edge is the pen position and the baseline sits a fixed share of
//! the font size above the bottom edge.

use std::sync::LazyLock;

use folio_core::{BBox, Color};
use fontdue::{Font, FontSettings, Metrics};
use tiny_skia::{IntSize, Pixmap, PixmapPaint, Transform};

use crate::error::RasterError;

/// Share of the font size that glyph boxes extend below the baseline.
const GLYPH_DESCENT: f64 = 0.2;

static FALLBACK_FACE: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

static FALLBACK_FONT: LazyLock<Option<Font>> =
    LazyLock::new(|| Font::from_bytes(FALLBACK_FACE, FontSettings::default()).ok());

/// A glyph to draw, in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub text: String,
    pub bbox: BBox,
    pub size: f64,
    pub color: Color,
    /// Index into the scene's fonts of the embedded program.
    pub font: Option<usize>,
    /// Glyph index inside that program, for CID-keyed fonts.
    pub glyph_id: Option<u16>,
}

/// Parse an embedded TrueType or OpenType program.
pub fn load_font(bytes: &[u8]) -> Result<Font, RasterError> {
    Font::from_bytes(bytes, FontSettings::default()).map_err(|e| RasterError::Font(e.to_string()))
}

/// Draw `glyph` onto `pixmap`, whose top-left corner is `origin` in page
/// units, at `scale` pixels per unit.
pub(crate) fn draw_glyph(
    pixmap: &mut Pixmap,
    glyph: &PlacedGlyph,
    fonts: &[Font],
    origin: (f64, f64),
    scale: f64,
) {
    let px = (glyph.size * scale) as f32;
    if !(px >= 1.0) {
        return;
    }
    let embedded = glyph.font.and_then(|i| fonts.get(i));
    let mut pen_x = (glyph.bbox.x0 - origin.0) * scale;
    let baseline = (glyph.bbox.bottom - GLYPH_DESCENT * glyph.size - origin.1) * scale;

    if let (Some(font), Some(id)) = (embedded, glyph.glyph_id) {
        let (metrics, coverage) = font.rasterize_indexed(id, px);
        blit(pixmap, &metrics, &coverage, pen_x, baseline, glyph.color);
        return;
    }

    // One extracted glyph may carry several characters, e.g. a ligature.
    for ch in glyph.text.chars() {
        if ch.is_whitespace() || ch == char::REPLACEMENT_CHARACTER {
            continue;
        }
        let font = embedded
            .filter(|f| f.lookup_glyph_index(ch) != 0)
            .or_else(|| FALLBACK_FONT.as_ref());
        let Some(font) = font else {
            return;
        };
        let (metrics, coverage) = font.rasterize(ch, px);
        blit(pixmap, &metrics, &coverage, pen_x, baseline, glyph.color);
        pen_x += f64::from(metrics.advance_width);
    }
}

/// Composite a coverage bitmap in `color` with its origin on the baseline.
fn blit(
    pixmap: &mut Pixmap,
    metrics: &Metrics,
    coverage: &[u8],
    pen_x: f64,
    baseline: f64,
    color: Color,
) {
    // Blank glyphs rasterize to an empty bitmap.
    let Some(size) = IntSize::from_wh(metrics.width as u32, metrics.height as u32) else {
        return;
    };
    let (r, g, b) = color.to_rgb8();
    let mut data = Vec::with_capacity(coverage.len() * 4);
    for &alpha in coverage {
        data.extend_from_slice(&[
            premultiply(r, alpha),
            premultiply(g, alpha),
            premultiply(b, alpha),
            alpha,
        ]);
    }
    let Some(mask) = Pixmap::from_vec(data, size) else {
        return;
    };
    // fontdue puts the bitmap's bottom-left corner at (xmin, ymin), y up.
    let x = pen_x.round() as i32 + metrics.xmin;
    let y = baseline.round() as i32 - metrics.ymin - metrics.height as i32;
    pixmap.draw_pixmap(x, y, mask.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
}

fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
