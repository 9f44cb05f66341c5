//! Helpers for reading lopdf objects: references, numbers, inherited page
//! attributes, and stream payloads.

use std::sync::LazyLock;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::BackendError;

static EMPTY_DICT: LazyLock<Dictionary> = LazyLock::new(Dictionary::new);

/// Resolve an indirect reference, returning the referenced object.
///
/// Non-reference objects and dangling references are returned as-is.
pub(crate) fn resolve_ref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Result<f64, BackendError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(*f as f64),
        _ => Err(BackendError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// A dictionary entry resolved through at most one reference.
pub(crate) fn dict_get<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| resolve_ref(doc, o))
}

pub(crate) fn dict_get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    dict_get(doc, dict, key).and_then(|o| o.as_dict().ok())
}

pub(crate) fn dict_get_f64(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    dict_get(doc, dict, key).and_then(|o| object_to_f64(o).ok())
}

/// Name value of a dictionary entry as a string.
pub(crate) fn dict_get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict_get(doc, dict, key)
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, BackendError> {
    let mut current_id = page_id;
    // Bounded walk; malformed trees can contain /Parent cycles.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(resolve_ref(doc, value)));
        }

        match dict.get(b"Parent") {
            Ok(parent_obj) => {
                current_id = parent_obj
                    .as_reference()
                    .map_err(|e| BackendError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Ok(None)
}

/// The page's resources dictionary, or an empty one when none is set.
pub(crate) fn page_resources(
    doc: &Document,
    page_id: ObjectId,
) -> Result<&Dictionary, BackendError> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj
            .as_dict()
            .map_err(|_| BackendError::Parse("/Resources is not a dictionary".to_string())),
        None => Ok(&EMPTY_DICT),
    }
}

/// Page media box as `[x0, y0, x1, y1]`, defaulting to US Letter.
pub(crate) fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4], BackendError> {
    let Some(obj) = resolve_inherited(doc, page_id, b"MediaBox")? else {
        return Ok([0.0, 0.0, 612.0, 792.0]);
    };
    let array = obj
        .as_array()
        .map_err(|_| BackendError::Parse("/MediaBox is not an array".to_string()))?;
    if array.len() != 4 {
        return Err(BackendError::Parse(format!(
            "expected 4-element array for box, got {}",
            array.len()
        )));
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(array) {
        *slot = object_to_f64(resolve_ref(doc, item))?;
    }
    let [x0, y0, x1, y1] = out;
    Ok([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)])
}

/// Decode a stream, decompressing if it carries a /Filter.
pub(crate) fn decode_stream(stream: &Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Get the content stream bytes from a page dictionary.
///
/// Handles both single stream references and arrays of stream references.
pub(crate) fn page_content_bytes(
    doc: &Document,
    page_dict: &Dictionary,
) -> Result<Vec<u8>, BackendError> {
    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => resolve_ref(doc, obj),
        Err(_) => return Ok(Vec::new()),
    };

    match contents_obj {
        Object::Stream(stream) => decode_stream(stream),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let stream = resolve_ref(doc, item).as_stream().map_err(|e| {
                    BackendError::Parse(format!("/Contents array item is not a stream: {e}"))
                })?;
                let bytes = decode_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(BackendError::Parse(
            "/Contents is not a stream or array".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn object_to_f64_accepts_numbers() {
        assert_eq!(object_to_f64(&Object::Integer(7)).unwrap(), 7.0);
        assert_eq!(object_to_f64(&Object::Real(1.5)).unwrap(), 1.5);
        assert!(object_to_f64(&Object::Boolean(true)).is_err());
    }

    #[test]
    fn inherited_media_box_from_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 400.into(), 500.into()],
            }),
        );
        assert_eq!(page_media_box(&doc, page_id).unwrap(), [0.0, 0.0, 400.0, 500.0]);
    }

    #[test]
    fn missing_media_box_defaults_to_letter() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert_eq!(page_media_box(&doc, page_id).unwrap(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn missing_resources_is_empty() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        assert!(page_resources(&doc, page_id).unwrap().is_empty());
    }

    #[test]
    fn content_array_is_joined() {
        let mut doc = Document::with_version("1.5");
        let a = doc.add_object(Stream::new(dictionary! {}, b"q".to_vec()));
        let b = doc.add_object(Stream::new(dictionary! {}, b"Q".to_vec()));
        let page = dictionary! { "Contents" => vec![a.into(), b.into()] };
        assert_eq!(page_content_bytes(&doc, &page).unwrap(), b"q Q".to_vec());
    }

    #[test]
    fn no_contents_is_empty() {
        let doc = Document::with_version("1.5");
        assert!(page_content_bytes(&doc, &dictionary! {}).unwrap().is_empty());
    }
}
