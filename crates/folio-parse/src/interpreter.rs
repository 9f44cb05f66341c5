//! Content stream interpreter.
//!
//! Walks the operators of a decoded content stream, maintaining graphics
//! and text state, and reports glyphs, painted paths and placed images to a
//! [`ContentHandler`]. Form XObjects are interpreted recursively with their
//! own resources, bounded by [`ExtractOptions::max_recursion_depth`].

use std::collections::HashMap;

use folio_core::{BBox, Ctm, PathObject, PathSegment, Point};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::BackendError;
use crate::fonts::LoadedFont;
use crate::handler::{CharEvent, ContentHandler, GlyphPaint, ImageEvent};
use crate::objects::{decode_stream, dict_get_dict, object_to_f64, resolve_ref};
use crate::state::InterpreterState;

/// Glyph box extent below the baseline, in text space units.
const GLYPH_DESCENT: f64 = -0.2;
/// Glyph box extent above the baseline, in text space units.
const GLYPH_ASCENT: f64 = 0.8;

/// Options for content stream interpretation.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum nesting of Form XObjects. Default is `10`.
    pub max_recursion_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 10,
        }
    }
}

/// Path under construction, in page coordinates.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.segments.push(PathSegment::CurveTo(c1, c2, p));
        self.current = Some(p);
    }

    fn close(&mut self) {
        if !self.segments.is_empty() {
            self.segments.push(PathSegment::ClosePath);
            self.current = self.subpath_start;
        }
    }

    fn take(&mut self) -> Vec<PathSegment> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}

/// Interpret one content stream.
///
/// `depth` is the current Form XObject nesting level (0 for page content).
pub(crate) fn interpret_content_stream(
    doc: &Document,
    stream_bytes: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    depth: usize,
    state: &mut InterpreterState,
) -> Result<(), BackendError> {
    if depth > options.max_recursion_depth {
        return Err(BackendError::Interpreter(format!(
            "Form XObject recursion depth {} exceeds limit {}",
            depth, options.max_recursion_depth
        )));
    }

    let content = Content::decode(stream_bytes)
        .map_err(|e| BackendError::Parse(format!("failed to parse content stream: {e}")))?;
    let mut fonts: HashMap<String, LoadedFont> = HashMap::new();
    let mut path = PathBuilder::default();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            // --- Graphics state operators ---
            "q" => state.save_state(),
            "Q" => {
                if !state.restore_state() {
                    handler.on_warning("unbalanced Q operator".to_string());
                }
            }
            "cm" => {
                if let Some(m) = get_matrix(operands) {
                    state.concat_matrix(m);
                }
            }
            "w" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().line_width = v;
                }
            }

            // --- Color operators ---
            "G" | "RG" | "K" | "SC" | "SCN" => state.set_color(true, &get_components(operands)),
            "g" | "rg" | "k" | "sc" | "scn" => state.set_color(false, &get_components(operands)),

            // --- Path construction ---
            "m" => {
                if let (Some(x), Some(y)) = (get_f64(operands, 0), get_f64(operands, 1)) {
                    path.move_to(to_page(state, x, y));
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (get_f64(operands, 0), get_f64(operands, 1)) {
                    path.line_to(to_page(state, x, y));
                }
            }
            "c" => {
                if let Some(v) = get_numbers::<6>(operands) {
                    path.curve_to(
                        to_page(state, v[0], v[1]),
                        to_page(state, v[2], v[3]),
                        to_page(state, v[4], v[5]),
                    );
                }
            }
            "v" => {
                if let Some(v) = get_numbers::<4>(operands) {
                    let c2 = to_page(state, v[0], v[1]);
                    let p = to_page(state, v[2], v[3]);
                    let c1 = path.current.unwrap_or(c2);
                    path.curve_to(c1, c2, p);
                }
            }
            "y" => {
                if let Some(v) = get_numbers::<4>(operands) {
                    let p = to_page(state, v[2], v[3]);
                    path.curve_to(to_page(state, v[0], v[1]), p, p);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = get_numbers::<4>(operands) {
                    path.move_to(to_page(state, x, y));
                    path.line_to(to_page(state, x + w, y));
                    path.line_to(to_page(state, x + w, y + h));
                    path.line_to(to_page(state, x, y + h));
                    path.close();
                }
            }
            "h" => path.close(),

            // --- Path painting ---
            "S" => paint(&mut path, state, handler, true, false, false),
            "s" => {
                path.close();
                paint(&mut path, state, handler, true, false, false);
            }
            "f" | "F" => paint(&mut path, state, handler, false, true, false),
            "f*" => paint(&mut path, state, handler, false, true, true),
            "B" => paint(&mut path, state, handler, true, true, false),
            "B*" => paint(&mut path, state, handler, true, true, true),
            "b" => {
                path.close();
                paint(&mut path, state, handler, true, true, false);
            }
            "b*" => {
                path.close();
                paint(&mut path, state, handler, true, true, true);
            }
            "n" => {
                path.take();
            }
            // Clipping is not tracked.
            "W" | "W*" => {}

            // --- Text object and state ---
            "BT" => state.begin_text(),
            "ET" => state.end_text(),
            "Tf" => {
                if let Some(name) = operands.first().and_then(operand_to_name) {
                    state.gs_mut().font_name = Some(name);
                }
                if let Some(size) = get_f64(operands, 1) {
                    state.gs_mut().font_size = size;
                }
            }
            "Tc" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().h_scaling = v / 100.0;
                }
            }
            "TL" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().leading = v;
                }
            }
            "Ts" => {
                if let Some(v) = get_f64(operands, 0) {
                    state.gs_mut().rise = v;
                }
            }
            "Tr" => match get_f64(operands, 0) {
                Some(v) if (0.0..=7.0).contains(&v) => state.gs_mut().render_mode = v as u8,
                _ => handler.on_warning("invalid Tr operand".to_string()),
            },
            "Td" => {
                if let (Some(tx), Some(ty)) = (get_f64(operands, 0), get_f64(operands, 1)) {
                    state.move_text_position(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (get_f64(operands, 0), get_f64(operands, 1)) {
                    state.move_text_position_and_set_leading(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = get_matrix(operands) {
                    state.set_text_matrix(m);
                }
            }
            "T*" => state.move_to_next_line(),

            // --- Text showing ---
            "Tj" => {
                if let Some(bytes) = operands.first().and_then(operand_to_bytes) {
                    let font = current_font(doc, resources, state, &mut fonts, handler);
                    show_string(bytes, &font, state, handler);
                }
            }
            "'" => {
                state.move_to_next_line();
                if let Some(bytes) = operands.first().and_then(operand_to_bytes) {
                    let font = current_font(doc, resources, state, &mut fonts, handler);
                    show_string(bytes, &font, state, handler);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (get_f64(operands, 0), get_f64(operands, 1)) {
                    state.gs_mut().word_spacing = aw;
                    state.gs_mut().char_spacing = ac;
                }
                state.move_to_next_line();
                if let Some(bytes) = operands.get(2).and_then(operand_to_bytes) {
                    let font = current_font(doc, resources, state, &mut fonts, handler);
                    show_string(bytes, &font, state, handler);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let font = current_font(doc, resources, state, &mut fonts, handler);
                    show_positioned(items, &font, state, handler);
                }
            }

            // --- XObjects ---
            "Do" => {
                if let Some(name) = operands.first().and_then(operand_to_name) {
                    handle_do(doc, resources, handler, options, depth, state, &name)?;
                }
            }

            _ => {}
        }
    }

    Ok(())
}

// --- Operand extraction helpers ---

fn get_f64(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| object_to_f64(o).ok())
}

fn get_numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = get_f64(operands, i)?;
    }
    Some(out)
}

fn get_matrix(operands: &[Object]) -> Option<Ctm> {
    get_numbers::<6>(operands).map(|[a, b, c, d, e, f]| Ctm::new(a, b, c, d, e, f))
}

/// Numeric operands of a color operator; a trailing pattern name is dropped.
fn get_components(operands: &[Object]) -> Vec<f32> {
    operands
        .iter()
        .filter_map(|o| object_to_f64(o).ok())
        .map(|v| v as f32)
        .collect()
}

fn operand_to_name(o: &Object) -> Option<String> {
    o.as_name()
        .ok()
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

fn operand_to_bytes(o: &Object) -> Option<&[u8]> {
    match o {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

fn to_page(state: &InterpreterState, x: f64, y: f64) -> Point {
    state.ctm().transform_point(Point::new(x, y))
}

// --- Painting ---

fn paint(
    path: &mut PathBuilder,
    state: &InterpreterState,
    handler: &mut dyn ContentHandler,
    stroke: bool,
    fill: bool,
    even_odd: bool,
) {
    let segments = path.take();
    if segments.is_empty() {
        return;
    }
    let gs = state.gs();
    handler.on_path_painted(PathObject {
        segments,
        stroke,
        fill,
        even_odd,
        line_width: gs.line_width * state.ctm().vertical_scale(),
        stroke_color: gs.stroke_color,
        fill_color: gs.fill_color,
    });
}

// --- Text ---

/// The font selected by the last `Tf`, loaded once per resource name.
fn current_font(
    doc: &Document,
    resources: &Dictionary,
    state: &InterpreterState,
    cache: &mut HashMap<String, LoadedFont>,
    handler: &mut dyn ContentHandler,
) -> LoadedFont {
    let name = state.gs().font_name.clone().unwrap_or_default();
    if let Some(font) = cache.get(&name) {
        return font.clone();
    }
    let font = match dict_get_dict(doc, resources, b"Font")
        .and_then(|fonts| dict_get_dict(doc, fonts, name.as_bytes()))
    {
        Some(dict) => LoadedFont::load(doc, dict).unwrap_or_else(|e| {
            handler.on_warning(format!("font /{name}: {e}"));
            LoadedFont::fallback(&name)
        }),
        None => {
            handler.on_warning(format!("font /{name} not found in resources"));
            LoadedFont::fallback(&name)
        }
    };
    cache.insert(name, font.clone());
    font
}

fn show_string(
    bytes: &[u8],
    font: &LoadedFont,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
) {
    for glyph in font.decode(bytes) {
        let w0 = glyph.width / 1000.0;
        let trm = state.text_rendering_matrix();
        let bbox = transform_box(&trm, 0.0, GLYPH_DESCENT, w0, GLYPH_ASCENT);
        let size = state.gs().font_size.abs()
            * state.text_matrix().concat(state.ctm()).vertical_scale();

        handler.on_char(CharEvent {
            text: glyph.text,
            size,
            bbox,
            paint: GlyphPaint {
                glyph_id: font.glyph_id(glyph.code),
                font_program: font.program(),
                color: state.gs().fill_color,
                visible: state.gs().paints_glyphs(),
            },
        });

        let gs = state.gs();
        let word_spacing = if glyph.is_word_space { gs.word_spacing } else { 0.0 };
        let tx = (w0 * gs.font_size + gs.char_spacing + word_spacing) * gs.h_scaling;
        state.advance_text_position(tx);
    }
}

/// `TJ`: strings are shown, numbers move the pen left by thousandths of
/// text space.
fn show_positioned(
    items: &[Object],
    font: &LoadedFont,
    state: &mut InterpreterState,
    handler: &mut dyn ContentHandler,
) {
    for item in items {
        match item {
            Object::String(bytes, _) => show_string(bytes, font, state, handler),
            other => {
                if let Ok(adjust) = object_to_f64(other) {
                    let gs = state.gs();
                    let tx = -(adjust / 1000.0) * gs.font_size * gs.h_scaling;
                    state.advance_text_position(tx);
                }
            }
        }
    }
}

/// Bounding box of the rectangle `[x0, y0, x1, y1]` mapped through `m`.
fn transform_box(m: &Ctm, x0: f64, y0: f64, x1: f64, y1: f64) -> BBox {
    let corners = [
        m.transform_point(Point::new(x0, y0)),
        m.transform_point(Point::new(x1, y0)),
        m.transform_point(Point::new(x0, y1)),
        m.transform_point(Point::new(x1, y1)),
    ];
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    BBox::new(min_x, min_y, max_x, max_y)
}

// --- XObjects ---

fn handle_do(
    doc: &Document,
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    depth: usize,
    state: &mut InterpreterState,
    name: &str,
) -> Result<(), BackendError> {
    let Some(xobjects) = dict_get_dict(doc, resources, b"XObject") else {
        handler.on_warning(format!("no /XObject dictionary in resources for Do /{name}"));
        return Ok(());
    };
    let Ok(entry) = xobjects.get(name.as_bytes()) else {
        handler.on_warning(format!("XObject /{name} not found in resources"));
        return Ok(());
    };
    let object_id = entry.as_reference().ok();
    let Ok(stream) = resolve_ref(doc, entry).as_stream() else {
        handler.on_warning(format!("XObject /{name} is not a stream"));
        return Ok(());
    };

    let subtype = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .unwrap_or(b"");

    match subtype {
        b"Form" => {
            handle_form_xobject(doc, stream, name, resources, handler, options, depth, state)
        }
        b"Image" => {
            handle_image_xobject(name, object_id, state, handler);
            Ok(())
        }
        _ => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_form_xobject(
    doc: &Document,
    stream: &Stream,
    name: &str,
    parent_resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
    depth: usize,
    state: &mut InterpreterState,
) -> Result<(), BackendError> {
    state.save_state();

    if let Some(m) = stream
        .dict
        .get(b"Matrix")
        .ok()
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| get_matrix(arr))
    {
        state.concat_matrix(m);
    }

    let form_resources = dict_get_dict(doc, &stream.dict, b"Resources").unwrap_or(parent_resources);

    let content_bytes = decode_stream(stream).map_err(|e| {
        BackendError::Interpreter(format!("failed to decode Form XObject /{name} stream: {e}"))
    })?;

    let result = interpret_content_stream(
        doc,
        &content_bytes,
        form_resources,
        handler,
        options,
        depth + 1,
        state,
    );

    state.restore_state();
    result
}

fn handle_image_xobject(
    name: &str,
    object_id: Option<lopdf::ObjectId>,
    state: &InterpreterState,
    handler: &mut dyn ContentHandler,
) {
    let bbox = transform_box(state.ctm(), 0.0, 0.0, 1.0, 1.0);

    #[cfg(feature = "tracing")]
    tracing::debug!(name, ?bbox, "image placed");

    handler.on_image(ImageEvent {
        name: name.to_string(),
        object_id,
        bbox,
    });
}
