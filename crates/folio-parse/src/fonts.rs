//! Font metrics and code-to-Unicode mapping.
//!
//! Two font shapes are distinguished: simple fonts with single-byte codes
//! and a `/Widths` table, and composite (`/Type0`) fonts with two-byte codes
//! whose widths come from the descendant CIDFont's `/W` array. A ToUnicode
//! CMap takes priority for text; without one, simple fonts are read as
//! Latin-1 and composite codes become U+FFFD.
//!
//! An embedded TrueType or OpenType program is remembered by object id so
//! glyphs can be rasterized again from their own outlines.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::cmap::CMap;
use crate::error::BackendError;
use crate::objects::{
    decode_stream, dict_get, dict_get_dict, dict_get_f64, dict_get_name, object_to_f64,
    resolve_ref,
};

/// Width used for simple-font codes outside `/Widths`.
const DEFAULT_SIMPLE_WIDTH: f64 = 600.0;
/// `/DW` default for CIDFonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// A glyph decoded from a text-showing operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub text: String,
    /// Advance width in glyph space (1/1000 text space units).
    pub width: f64,
    /// Whether this is the single-byte space code that `Tw` applies to.
    pub is_word_space: bool,
}

/// Metrics and mapping for one font resource.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub base_name: String,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: Option<CMap>,
    program: Option<ObjectId>,
    /// `/CIDToGIDMap` stream as glyph ids indexed by CID. `None` is Identity.
    cid_to_gid: Option<Vec<u16>>,
}

impl LoadedFont {
    /// A font with no metrics at all, used when `Tf` names a missing resource.
    pub fn fallback(name: &str) -> Self {
        Self {
            base_name: name.to_string(),
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_SIMPLE_WIDTH,
            to_unicode: None,
            program: None,
            cid_to_gid: None,
        }
    }

    /// Load metrics from a font dictionary.
    ///
    /// A malformed ToUnicode stream is an error; missing metrics are not.
    pub fn load(doc: &Document, dict: &Dictionary) -> Result<Self, BackendError> {
        let base_name = dict_get_name(doc, dict, b"BaseFont").unwrap_or_default();
        let subtype = dict_get_name(doc, dict, b"Subtype").unwrap_or_default();

        let to_unicode = match dict_get(doc, dict, b"ToUnicode").map(|o| o.as_stream()) {
            Some(Ok(stream)) => {
                let bytes = decode_stream(stream)?;
                let cmap = CMap::parse(&bytes).map_err(|e| {
                    BackendError::Font(format!("bad ToUnicode for {base_name}: {e}"))
                })?;
                Some(cmap)
            }
            _ => None,
        };

        if subtype == "Type0" {
            let descendant = dict_get(doc, dict, b"DescendantFonts")
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve_ref(doc, o).as_dict().ok());
            let (cid_widths, default_width) = match descendant {
                Some(cid) => (
                    parse_cid_widths(doc, cid),
                    dict_get_f64(doc, cid, b"DW").unwrap_or(DEFAULT_CID_WIDTH),
                ),
                None => (HashMap::new(), DEFAULT_CID_WIDTH),
            };
            let program = descendant
                .and_then(|cid| dict_get_dict(doc, cid, b"FontDescriptor"))
                .and_then(|fd| embedded_program(doc, fd));
            let cid_to_gid = match descendant.and_then(|cid| dict_get(doc, cid, b"CIDToGIDMap")) {
                Some(Object::Stream(stream)) => Some(
                    decode_stream(stream)?
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                        .collect(),
                ),
                _ => None,
            };
            return Ok(Self {
                base_name,
                two_byte: true,
                first_char: 0,
                widths: Vec::new(),
                cid_widths,
                default_width,
                to_unicode,
                program,
                cid_to_gid,
            });
        }

        let first_char = dict_get_f64(doc, dict, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
        let widths = dict_get(doc, dict, b"Widths")
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| object_to_f64(resolve_ref(doc, w)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let descriptor = dict_get_dict(doc, dict, b"FontDescriptor");
        let default_width = descriptor
            .and_then(|fd| dict_get_f64(doc, fd, b"MissingWidth"))
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_SIMPLE_WIDTH);

        Ok(Self {
            base_name,
            two_byte: false,
            first_char,
            widths,
            cid_widths: HashMap::new(),
            default_width,
            to_unicode,
            program: descriptor.and_then(|fd| embedded_program(doc, fd)),
            cid_to_gid: None,
        })
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Object id of the embedded font program, when it is TrueType or
    /// OpenType.
    pub fn program(&self) -> Option<ObjectId> {
        self.program
    }

    /// Glyph index of a code inside the embedded program.
    ///
    /// Only composite fonts address glyphs by CID; simple font glyphs are
    /// found through their Unicode text.
    pub fn glyph_id(&self, code: u32) -> Option<u16> {
        if !self.two_byte || self.program.is_none() {
            return None;
        }
        match &self.cid_to_gid {
            Some(map) => map.get(code as usize).copied(),
            None => u16::try_from(code).ok(),
        }
    }

    /// Glyph-space advance width for a code.
    pub fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self.cid_widths.get(&code).copied().unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or(self.default_width)
    }

    /// Unicode text for a code.
    pub fn unicode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.lookup(code)) {
            return text.to_string();
        }
        if self.two_byte {
            return char::REPLACEMENT_CHARACTER.to_string();
        }
        char::from_u32(code)
            .map(|c| c.to_string())
            .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string())
    }

    /// Split a string operand into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = match pair {
                        [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                        [single] => u32::from(*single),
                        _ => 0,
                    };
                    Glyph {
                        code,
                        text: self.unicode(code),
                        width: self.width(code),
                        is_word_space: false,
                    }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|b| {
                    let code = u32::from(*b);
                    Glyph {
                        code,
                        text: self.unicode(code),
                        width: self.width(code),
                        is_word_space: code == 32,
                    }
                })
                .collect()
        }
    }
}

/// `/FontFile2`, or a `/FontFile3` stream of subtype `OpenType`.
///
/// Bare CFF and Type 1 programs are not returned.
fn embedded_program(doc: &Document, descriptor: &Dictionary) -> Option<ObjectId> {
    if let Ok(id) = descriptor.get(b"FontFile2").and_then(Object::as_reference) {
        return Some(id);
    }
    let id = descriptor.get(b"FontFile3").and_then(Object::as_reference).ok()?;
    let stream = doc.get_object(id).and_then(Object::as_stream).ok()?;
    let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).ok()?;
    (subtype == b"OpenType").then_some(id)
}

/// Parse a CIDFont `/W` array.
///
/// Entries take two forms: `c [w1 w2 ...]` for consecutive CIDs starting
/// at `c`, and `c_first c_last w` for a range sharing one width.
fn parse_cid_widths(doc: &Document, cid_font: &Dictionary) -> HashMap<u32, f64> {
    let mut out = HashMap::new();
    let Some(items) = dict_get(doc, cid_font, b"W").and_then(|o| o.as_array().ok()) else {
        return out;
    };
    let items: Vec<&Object> = items.iter().map(|o| resolve_ref(doc, o)).collect();
    let mut i = 0;
    while i < items.len() {
        let Ok(first) = object_to_f64(items[i]) else {
            break;
        };
        let first = first as u32;
        match items.get(i + 1) {
            Some(Object::Array(ws)) => {
                for (offset, w) in ws.iter().enumerate() {
                    if let Ok(w) = object_to_f64(resolve_ref(doc, w)) {
                        out.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Ok(last), Some(Ok(w))) =
                    (object_to_f64(last), items.get(i + 2).map(|o| object_to_f64(o)))
                else {
                    break;
                };
                for cid in first..=(last as u32) {
                    out.insert(cid, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    out
}
