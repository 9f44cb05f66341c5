//! SVG export of a page region.
//!
//! The region's painted paths and glyphs are written as SVG 1.1 in page
//! coordinates, with a `viewBox` equal to the region so the output is
//! cropped to it. Placed raster images are not embedded; a region that
//! overlaps one cannot be exported faithfully and is rejected.

use std::fmt;
use std::fmt::Write as _;

use crate::geometry::BBox;
use crate::path::{PathObject, PathSegment};
use crate::text::Char;

/// Markers that show the markup draws something.
const DRAWABLE_MARKERS: [&str; 2] = ["<path", "<text"];

/// Options for SVG generation.
#[derive(Debug, Clone)]
pub struct SvgOptions {
    /// Scale from page units to the SVG's `width`/`height`. Default is `1.0`.
    pub scale: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Why a region was not exported as SVG.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    /// The region overlaps a raster image that SVG output would drop.
    OverlapsRaster,
    /// The markup contains neither a path nor text.
    NoDrawablePrimitives,
    /// Rendering failed.
    Render(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::OverlapsRaster => write!(f, "region overlaps a raster image"),
            RejectReason::NoDrawablePrimitives => write!(f, "no drawable primitives in region"),
            RejectReason::Render(msg) => write!(f, "render failed: {msg}"),
        }
    }
}

/// Outcome of a vector export attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorExport {
    Markup(String),
    Rejected(RejectReason),
}

/// Renders the contents of one page region as SVG markup.
pub struct SvgRenderer {
    region: BBox,
}

impl SvgRenderer {
    /// Create a renderer for `region` (top-left page coordinates).
    pub fn new(region: BBox) -> Self {
        Self { region }
    }

    /// Generate SVG markup for every path and glyph touching the region.
    pub fn to_svg(
        &self,
        paths: &[PathObject],
        chars: &[Char],
        options: &SvgOptions,
    ) -> Result<String, RejectReason> {
        let r = self.region;
        let finite = [r.x0, r.top, r.x1, r.bottom].iter().all(|v| v.is_finite());
        if !finite || r.width() <= 0.0 || r.height() <= 0.0 {
            return Err(RejectReason::Render(format!(
                "invalid region {} {} {} {}",
                r.x0, r.top, r.x1, r.bottom
            )));
        }

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\">",
            r.width() * options.scale,
            r.height() * options.scale,
            r.x0,
            r.top,
            r.width(),
            r.height(),
        );

        for path in paths {
            let touches = path.bbox().is_some_and(|b| overlaps_or_inside(&b, &r));
            if touches && (path.fill || path.stroke) {
                write_path(&mut svg, path);
            }
        }
        for ch in chars {
            if ch.text.trim().is_empty() || !overlaps_or_inside(&ch.bbox, &r) {
                continue;
            }
            let _ = writeln!(
                svg,
                "  <text x=\"{}\" y=\"{}\" font-size=\"{}\">{}</text>",
                ch.bbox.x0,
                ch.bbox.bottom,
                ch.size,
                escape_xml(&ch.text)
            );
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

/// Export `region` as SVG, or say why it cannot be.
///
/// Every failure is reported as [`VectorExport::Rejected`].
pub fn export_region(
    region: BBox,
    paths: &[PathObject],
    chars: &[Char],
    image_boxes: &[BBox],
) -> VectorExport {
    if image_boxes.iter().any(|b| b.intersects(&region)) {
        return VectorExport::Rejected(RejectReason::OverlapsRaster);
    }
    match SvgRenderer::new(region).to_svg(paths, chars, &SvgOptions::default()) {
        Ok(markup) if has_drawable(&markup) => VectorExport::Markup(markup),
        Ok(_) => VectorExport::Rejected(RejectReason::NoDrawablePrimitives),
        Err(reason) => VectorExport::Rejected(reason),
    }
}

/// Whether markup contains at least one drawable primitive.
pub fn has_drawable(markup: &str) -> bool {
    DRAWABLE_MARKERS.iter().any(|m| markup.contains(m))
}

// Degenerate boxes (horizontal or vertical rules) still count when they lie
// within the region.
fn overlaps_or_inside(b: &BBox, region: &BBox) -> bool {
    b.x0 <= region.x1 && region.x0 <= b.x1 && b.top <= region.bottom && region.top <= b.bottom
}

fn write_path(svg: &mut String, path: &PathObject) {
    let mut d = String::new();
    for seg in &path.segments {
        match seg {
            PathSegment::MoveTo(p) => {
                let _ = write!(d, "M{} {} ", p.x, p.y);
            }
            PathSegment::LineTo(p) => {
                let _ = write!(d, "L{} {} ", p.x, p.y);
            }
            PathSegment::CurveTo(c1, c2, p) => {
                let _ = write!(d, "C{} {} {} {} {} {} ", c1.x, c1.y, c2.x, c2.y, p.x, p.y);
            }
            PathSegment::ClosePath => d.push_str("Z "),
        }
    }
    let fill = if path.fill {
        path.fill_color.to_hex()
    } else {
        "none".to_string()
    };
    let _ = write!(svg, "  <path d=\"{}\" fill=\"{fill}\"", d.trim_end());
    if path.fill && path.even_odd {
        svg.push_str(" fill-rule=\"evenodd\"");
    }
    if path.stroke {
        let _ = write!(
            svg,
            " stroke=\"{}\" stroke-width=\"{}\"",
            path.stroke_color.to_hex(),
            path.line_width
        );
    }
    svg.push_str("/>\n");
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::path::Color;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> PathObject {
        PathObject {
            segments: vec![
                PathSegment::MoveTo(Point::new(x0, y0)),
                PathSegment::LineTo(Point::new(x1, y1)),
            ],
            stroke: true,
            fill: false,
            even_odd: false,
            line_width: 2.0,
            stroke_color: Color::Rgb(1.0, 0.0, 0.0),
            fill_color: Color::default(),
        }
    }

    fn region() -> BBox {
        BBox::new(100.0, 200.0, 300.0, 350.0)
    }

    #[test]
    fn test_svg_header_uses_region_viewbox() {
        let svg = SvgRenderer::new(region())
            .to_svg(&[], &[], &SvgOptions::default())
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.contains("viewBox=\"100 200 200 150\""));
        assert!(svg.contains("width=\"200\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_svg_scale_changes_size_not_viewbox() {
        let svg = SvgRenderer::new(region())
            .to_svg(&[], &[], &SvgOptions { scale: 2.0 })
            .unwrap();
        assert!(svg.contains("width=\"400\""));
        assert!(svg.contains("height=\"300\""));
        assert!(svg.contains("viewBox=\"100 200 200 150\""));
    }

    #[test]
    fn test_svg_includes_only_touching_paths() {
        let inside = line(120.0, 220.0, 280.0, 220.0);
        let outside = line(400.0, 500.0, 450.0, 550.0);
        let svg = SvgRenderer::new(region())
            .to_svg(&[inside, outside], &[], &SvgOptions::default())
            .unwrap();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("d=\"M120 220 L280 220\""));
        assert!(svg.contains("stroke=\"#ff0000\""));
        assert!(svg.contains("fill=\"none\""));
    }

    #[test]
    fn test_svg_escapes_text() {
        let ch = Char {
            text: "<&>".to_string(),
            bbox: BBox::new(150.0, 250.0, 160.0, 262.0),
            size: 12.0,
        };
        let svg = SvgRenderer::new(region())
            .to_svg(&[], &[ch], &SvgOptions::default())
            .unwrap();
        assert!(svg.contains(">&lt;&amp;&gt;</text>"));
    }

    #[test]
    fn test_export_accepts_drawable_region() {
        let out = export_region(region(), &[line(120.0, 220.0, 280.0, 300.0)], &[], &[]);
        assert!(matches!(out, VectorExport::Markup(ref m) if m.contains("<path")));
    }

    #[test]
    fn test_export_rejects_empty_region() {
        let out = export_region(region(), &[], &[], &[]);
        assert_eq!(out, VectorExport::Rejected(RejectReason::NoDrawablePrimitives));
    }

    #[test]
    fn test_export_rejects_raster_overlap() {
        let image = BBox::new(150.0, 250.0, 250.0, 330.0);
        let out = export_region(region(), &[line(120.0, 220.0, 280.0, 300.0)], &[], &[image]);
        assert_eq!(out, VectorExport::Rejected(RejectReason::OverlapsRaster));
    }

    #[test]
    fn test_export_rejects_degenerate_region() {
        let flat = BBox::new(100.0, 200.0, 300.0, 200.0);
        let out = export_region(flat, &[line(100.0, 200.0, 300.0, 200.0)], &[], &[]);
        assert!(matches!(out, VectorExport::Rejected(RejectReason::Render(_))));
    }
}
