//! Painted vector paths in page coordinates.

use crate::geometry::{BBox, Point};

/// A path construction segment, already transformed to top-left page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bézier: two control points then the end point.
    CurveTo(Point, Point, Point),
    ClosePath,
}

/// Paint colour, kept in the colour space it was specified in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Gray(f32),
    Rgb(f32, f32, f32),
    Cmyk(f32, f32, f32, f32),
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    /// Convert to 8-bit sRGB components.
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let (r, g, b) = match *self {
            Color::Gray(g) => (g, g, g),
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Cmyk(c, m, y, k) => ((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)),
        };
        let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (to8(r), to8(g), to8(b))
    }

    /// `#rrggbb` form for SVG attributes.
    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

/// A path that was stroked and/or filled on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PathObject {
    pub segments: Vec<PathSegment>,
    pub stroke: bool,
    pub fill: bool,
    pub even_odd: bool,
    /// Stroke width in page units.
    pub line_width: f64,
    pub stroke_color: Color,
    pub fill_color: Color,
}

impl PathObject {
    /// Bounding box of every point in the path (control points included).
    ///
    /// Returns `None` for a path with no points.
    pub fn bbox(&self) -> Option<BBox> {
        let mut points = self.segments.iter().flat_map(|seg| match *seg {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![p],
            PathSegment::CurveTo(c1, c2, p) => vec![c1, c2, p],
            PathSegment::ClosePath => Vec::new(),
        });
        let first = points.next()?;
        let init = BBox::new(first.x, first.y, first.x, first.y);
        Some(points.fold(init, |b, p| b.union(&BBox::new(p.x, p.y, p.x, p.y))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> PathObject {
        PathObject {
            segments: vec![
                PathSegment::MoveTo(Point::new(x0, y0)),
                PathSegment::LineTo(Point::new(x1, y0)),
                PathSegment::LineTo(Point::new(x1, y1)),
                PathSegment::LineTo(Point::new(x0, y1)),
                PathSegment::ClosePath,
            ],
            stroke: true,
            fill: false,
            even_odd: false,
            line_width: 1.0,
            stroke_color: Color::default(),
            fill_color: Color::default(),
        }
    }

    #[test]
    fn bbox_covers_all_points() {
        let path = rect_path(10.0, 20.0, 110.0, 70.0);
        assert_eq!(path.bbox(), Some(BBox::new(10.0, 20.0, 110.0, 70.0)));
    }

    #[test]
    fn bbox_of_empty_path_is_none() {
        let mut path = rect_path(0.0, 0.0, 1.0, 1.0);
        path.segments.clear();
        assert_eq!(path.bbox(), None);
    }

    #[test]
    fn color_conversions() {
        assert_eq!(Color::Gray(1.0).to_hex(), "#ffffff");
        assert_eq!(Color::Rgb(1.0, 0.0, 0.0).to_hex(), "#ff0000");
        assert_eq!(Color::Cmyk(0.0, 0.0, 0.0, 1.0).to_rgb8(), (0, 0, 0));
    }
}
