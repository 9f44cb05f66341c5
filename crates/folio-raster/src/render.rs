//! Region rendering with tiny-skia.
//!
//! A [`Scene`] holds what one page paints: decoded images, vector paths and
//! glyphs, all in top-left page coordinates. [`render_region`] crops a
//! padded region out of it at the requested resolution on a white
//! background and encodes the result as PNG.

use std::fmt;

use folio_core::{BBox, Color, PathObject, PathSegment};
use fontdue::Font;
use image::RgbaImage;
use tiny_skia::{FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use crate::error::RasterError;
use crate::text::{PlacedGlyph, draw_glyph, load_font};

/// Options for region rasterization.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Output resolution. Default is `300`.
    pub dpi: f64,
    /// Page units added on every side of the region. Default is `2.0`.
    pub padding: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: 300.0,
            padding: 2.0,
        }
    }
}

impl RasterOptions {
    /// Pixels per page unit.
    pub fn scale(&self) -> f64 {
        self.dpi / 72.0
    }
}

/// A decoded image and the page box it was placed in.
#[derive(Debug, Clone)]
pub struct PlacedRaster {
    pub bbox: BBox,
    pub pixels: RgbaImage,
}

/// Everything paintable on one page.
///
/// Images are painted first, then paths, then glyphs.
pub struct Scene {
    /// The page box; rendering never extends past it.
    pub page: BBox,
    pub paths: Vec<PathObject>,
    pub images: Vec<PlacedRaster>,
    pub glyphs: Vec<PlacedGlyph>,
    fonts: Vec<Font>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            page: BBox::new(0.0, 0.0, width, height),
            paths: Vec::new(),
            images: Vec::new(),
            glyphs: Vec::new(),
            fonts: Vec::new(),
        }
    }

    /// Load an embedded font program and return the index glyphs refer to
    /// it by.
    pub fn add_font(&mut self, program: &[u8]) -> Result<usize, RasterError> {
        self.fonts.push(load_font(program)?);
        Ok(self.fonts.len() - 1)
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("page", &self.page)
            .field("paths", &self.paths.len())
            .field("images", &self.images.len())
            .field("glyphs", &self.glyphs.len())
            .field("fonts", &self.fonts.len())
            .finish()
    }
}

/// Render `region` of `scene` to PNG bytes.
pub fn render_region(
    region: BBox,
    scene: &Scene,
    options: &RasterOptions,
) -> Result<Vec<u8>, RasterError> {
    let padded = region.expand(options.padding);
    let clip = BBox::new(
        padded.x0.max(scene.page.x0),
        padded.top.max(scene.page.top),
        padded.x1.min(scene.page.x1),
        padded.bottom.min(scene.page.bottom),
    );
    let (width, height) = (clip.x1 - clip.x0, clip.bottom - clip.top);
    if !(width > 0.0 && height > 0.0) {
        return Err(RasterError::EmptyRegion { width, height });
    }

    let scale = options.scale();
    let px_w = (width * scale).ceil().max(1.0) as u32;
    let px_h = (height * scale).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(px_w, px_h)
        .ok_or_else(|| RasterError::Encode(format!("cannot allocate {px_w}x{px_h} pixmap")))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let s = scale as f32;
    let (dx, dy) = (-(clip.x0 as f32) * s, -(clip.top as f32) * s);
    let to_pixels = Transform::from_row(s, 0.0, 0.0, s, dx, dy);

    for placed in &scene.images {
        if placed.bbox.intersects(&clip) {
            draw_image(&mut pixmap, placed, to_pixels)?;
        }
    }
    for path in &scene.paths {
        draw_path(&mut pixmap, path, to_pixels);
    }
    for glyph in &scene.glyphs {
        if glyph.bbox.intersects(&clip) {
            draw_glyph(&mut pixmap, glyph, &scene.fonts, (clip.x0, clip.top), scale);
        }
    }

    pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))
}

fn draw_image(
    pixmap: &mut Pixmap,
    placed: &PlacedRaster,
    to_pixels: Transform,
) -> Result<(), RasterError> {
    let (w, h) = placed.pixels.dimensions();
    let size = IntSize::from_wh(w, h)
        .ok_or_else(|| RasterError::Image(format!("invalid image size {w}x{h}")))?;
    // Decoded images are opaque, so straight RGBA is already premultiplied.
    let source = Pixmap::from_vec(placed.pixels.as_raw().clone(), size)
        .ok_or_else(|| RasterError::Image("image buffer does not match its size".to_string()))?;

    let b = placed.bbox;
    let to_page = Transform::from_row(
        (b.width() / f64::from(w)) as f32,
        0.0,
        0.0,
        (b.height() / f64::from(h)) as f32,
        b.x0 as f32,
        b.top as f32,
    );
    let paint = PixmapPaint {
        quality: tiny_skia::FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, to_page.post_concat(to_pixels), None);
    Ok(())
}

fn draw_path(pixmap: &mut Pixmap, object: &PathObject, to_pixels: Transform) {
    if !object.fill && !object.stroke {
        return;
    }
    let mut pb = PathBuilder::new();
    for seg in &object.segments {
        match seg {
            PathSegment::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathSegment::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathSegment::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathSegment::ClosePath => pb.close(),
        }
    }
    // Degenerate paths (a lone move, zero-length lines) produce nothing.
    let Some(path) = pb.finish() else {
        return;
    };

    if object.fill {
        let rule = if object.even_odd {
            FillRule::EvenOdd
        } else {
            FillRule::Winding
        };
        pixmap.fill_path(&path, &paint_for(object.fill_color), rule, to_pixels, None);
    }
    if object.stroke {
        let stroke = Stroke {
            // Zero-width lines are drawn one device pixel wide.
            width: object.line_width.max(0.0) as f32,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint_for(object.stroke_color), &stroke, to_pixels, None);
    }
}

fn paint_for(color: Color) -> Paint<'static> {
    let (r, g, b) = color.to_rgb8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    paint
}
