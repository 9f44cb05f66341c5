//! Opened PDF documents and per-page extraction.

use std::path::Path;

use folio_core::{BBox, Char, CorpusError, Ctm, PathObject, TextLayout};
use lopdf::{Document, Object, ObjectId};

use crate::error::BackendError;
use crate::handler::{GlyphPaint, ImageEvent, PageCollector};
use crate::interpreter::{ExtractOptions, interpret_content_stream};
use crate::objects::{
    decode_stream, page_content_bytes, page_media_box, page_resources, resolve_ref,
};
use crate::state::InterpreterState;

/// A loaded PDF with its page tree flattened in reading order.
pub struct PdfDocument {
    inner: Document,
    page_ids: Vec<ObjectId>,
}

/// Everything painted on one page, in top-left page coordinates.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 0-based page index.
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub chars: Vec<Char>,
    /// Paint of each glyph, aligned with `chars`.
    pub glyphs: Vec<GlyphPaint>,
    pub paths: Vec<PathObject>,
    pub images: Vec<ImageEvent>,
    /// Recovered problems met while interpreting the page.
    pub warnings: Vec<String>,
}

impl PageContent {
    /// Glyphs assembled into lines.
    pub fn layout(&self) -> TextLayout {
        TextLayout::from_chars(&self.chars)
    }

    /// Page text, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.layout().text().to_string()
    }

    pub fn image_boxes(&self) -> Vec<BBox> {
        self.images.iter().map(|i| i.bbox).collect()
    }

    /// Boxes of painted paths, in painting order.
    pub fn path_boxes(&self) -> Vec<BBox> {
        self.paths.iter().filter_map(|p| p.bbox()).collect()
    }
}

/// Encoding of an image payload returned by [`PdfDocument::image_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// A complete JPEG file.
    Jpeg,
    /// Uncompressed samples, row-major, `components` per pixel.
    Raw,
}

/// Samples of an image XObject.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    /// Color components per pixel: 1 (gray), 3 (RGB) or 4 (CMYK).
    pub components: u8,
    pub encoding: ImageEncoding,
    pub data: Vec<u8>,
}

impl PdfDocument {
    /// Open a PDF file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Core(CorpusError::InvalidInput(
                "encrypted PDFs are not supported".to_string(),
            )));
        }

        // get_pages returns BTreeMap<u32, ObjectId> with 1-based keys.
        let page_ids = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Access the underlying lopdf document.
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, index: usize) -> Result<ObjectId, BackendError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            BackendError::Core(CorpusError::InvalidInput(format!(
                "page index {index} out of range (0..{})",
                self.page_count()
            )))
        })
    }

    /// Page width and height in points.
    pub fn page_size(&self, index: usize) -> Result<(f64, f64), BackendError> {
        let [x0, y0, x1, y1] = page_media_box(&self.inner, self.page_id(index)?)?;
        Ok((x1 - x0, y1 - y0))
    }

    /// Interpret one page's content.
    pub fn extract_page(
        &self,
        index: usize,
        options: &ExtractOptions,
    ) -> Result<PageContent, BackendError> {
        let page_id = self.page_id(index)?;
        let [x0, y0, x1, y1] = page_media_box(&self.inner, page_id)?;
        let page_dict = self
            .inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
        let content = page_content_bytes(&self.inner, page_dict)?;
        let resources = page_resources(&self.inner, page_id)?;

        // Flip into top-left coordinates with the media box origin at 0,0.
        let mut state = InterpreterState::new(Ctm::new(1.0, 0.0, 0.0, -1.0, -x0, y1));
        let mut collector = PageCollector::default();
        interpret_content_stream(
            &self.inner,
            &content,
            resources,
            &mut collector,
            options,
            0,
            &mut state,
        )?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            page = index,
            chars = collector.chars.len(),
            paths = collector.paths.len(),
            images = collector.images.len(),
            "page extracted"
        );

        Ok(PageContent {
            index,
            width: x1 - x0,
            height: y1 - y0,
            chars: collector.chars,
            glyphs: collector.glyphs,
            paths: collector.paths,
            images: collector.images,
            warnings: collector.warnings,
        })
    }

    /// Fetch the samples of an image XObject.
    ///
    /// DCT images are returned as JPEG bytes; unfiltered and Flate images
    /// as raw samples. Other filters and indexed color are unsupported.
    pub fn image_data(&self, id: ObjectId) -> Result<ImageData, BackendError> {
        let stream = self
            .inner
            .get_object(id)
            .and_then(|o| o.as_stream())
            .map_err(|e| BackendError::Parse(format!("image {id:?} is not a stream: {e}")))?;
        let dict = &stream.dict;
        let int = |key: &[u8]| dict.get(key).ok().and_then(|o| o.as_i64().ok());

        let width = int(b"Width").unwrap_or(0).max(0) as u32;
        let height = int(b"Height").unwrap_or(0).max(0) as u32;
        let bits_per_component = int(b"BitsPerComponent").unwrap_or(8).max(0) as u32;
        let components = self.color_components(dict.get(b"ColorSpace").ok())?;

        let filters: Vec<Vec<u8>> = match dict.get(b"Filter") {
            Ok(Object::Name(name)) => vec![name.clone()],
            Ok(Object::Array(arr)) => arr
                .iter()
                .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
                .collect(),
            _ => Vec::new(),
        };

        let (encoding, data) = match filters.last().map(Vec::as_slice) {
            Some(b"DCTDecode") if filters.len() == 1 => {
                (ImageEncoding::Jpeg, stream.content.clone())
            }
            None | Some(b"FlateDecode") => (ImageEncoding::Raw, decode_stream(stream)?),
            Some(other) => {
                return Err(BackendError::Parse(format!(
                    "unsupported image filter {}",
                    String::from_utf8_lossy(other)
                )));
            }
        };

        Ok(ImageData {
            width,
            height,
            bits_per_component,
            components,
            encoding,
            data,
        })
    }

    /// Decoded bytes of an embedded font program stream.
    pub fn font_program(&self, id: ObjectId) -> Result<Vec<u8>, BackendError> {
        let stream = self
            .inner
            .get_object(id)
            .and_then(|o| o.as_stream())
            .map_err(|e| BackendError::Font(format!("font program {id:?} is not a stream: {e}")))?;
        decode_stream(stream)
    }

    fn color_components(&self, colorspace: Option<&Object>) -> Result<u8, BackendError> {
        let Some(cs) = colorspace.map(|o| resolve_ref(&self.inner, o)) else {
            return Ok(1);
        };
        let (family, params) = match cs {
            Object::Name(name) => (name.as_slice(), None),
            Object::Array(arr) => match arr.first().and_then(|o| o.as_name().ok()) {
                Some(name) => (name, arr.get(1)),
                None => return Err(BackendError::Parse("empty color space array".to_string())),
            },
            _ => return Err(BackendError::Parse("invalid color space".to_string())),
        };
        match family {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(3),
            b"DeviceCMYK" | b"CMYK" => Ok(4),
            b"ICCBased" => {
                let n = params
                    .map(|o| resolve_ref(&self.inner, o))
                    .and_then(|o| o.as_stream().ok())
                    .and_then(|s| s.dict.get(b"N").ok())
                    .and_then(|o| o.as_i64().ok())
                    .unwrap_or(3);
                match n {
                    1 | 3 | 4 => Ok(n as u8),
                    _ => Err(BackendError::Parse(format!("unsupported ICC component count {n}"))),
                }
            }
            other => Err(BackendError::Parse(format!(
                "unsupported image color space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// Build a one-page PDF with the given content and resources.
    fn single_page_pdf(
        content: &[u8],
        resources: lopdf::Dictionary,
        doc: &mut Document,
    ) -> Vec<u8> {
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    #[test]
    fn open_invalid_bytes_returns_error() {
        let err = PdfDocument::from_bytes(b"not a pdf").err().unwrap();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let err = PdfDocument::open("/nonexistent/book.pdf").err().unwrap();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[test]
    fn extract_text_page() {
        let mut doc = Document::with_version("1.5");
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources = dictionary! { "Font" => dictionary! { "F1" => font } };
        let bytes = single_page_pdf(
            b"BT /F1 12 Tf 72 720 Td (Figure 1.1 shows) Tj ET",
            resources,
            &mut doc,
        );

        let pdf = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(pdf.page_count(), 1);
        assert_eq!(pdf.page_size(0).unwrap(), (612.0, 792.0));

        let page = pdf.extract_page(0, &ExtractOptions::default()).unwrap();
        assert_eq!(page.text(), "Figure 1.1 shows");
        assert!(page.chars[0].bbox.top < 72.0 + 1.0);
        assert!(page.warnings.is_empty());
    }

    #[test]
    fn page_index_out_of_range() {
        let mut doc = Document::with_version("1.5");
        let bytes = single_page_pdf(b"", dictionary! {}, &mut doc);
        let pdf = PdfDocument::from_bytes(&bytes).unwrap();
        assert!(matches!(
            pdf.extract_page(3, &ExtractOptions::default()),
            Err(BackendError::Core(CorpusError::InvalidInput(_)))
        ));
    }

    #[test]
    fn image_data_for_jpeg_and_raw() {
        let mut doc = Document::with_version("1.5");
        let jpeg = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            vec![0xFF, 0xD8, 0xFF, 0xD9],
        ));
        let raw = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0, 255],
        ));
        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => jpeg, "Im1" => raw },
        };
        let bytes = single_page_pdf(
            b"q 20 0 0 10 100 100 cm /Im0 Do Q q 20 0 0 10 200 100 cm /Im1 Do Q",
            resources,
            &mut doc,
        );
        let pdf = PdfDocument::from_bytes(&bytes).unwrap();
        let page = pdf.extract_page(0, &ExtractOptions::default()).unwrap();
        assert_eq!(page.images.len(), 2);

        let first = pdf.image_data(page.images[0].object_id.unwrap()).unwrap();
        assert_eq!(first.encoding, ImageEncoding::Jpeg);
        assert_eq!(first.components, 3);
        assert_eq!(first.data, vec![0xFF, 0xD8, 0xFF, 0xD9]);

        let second = pdf.image_data(page.images[1].object_id.unwrap()).unwrap();
        assert_eq!(second.encoding, ImageEncoding::Raw);
        assert_eq!(second.components, 1);
        assert_eq!(second.data, vec![0, 255]);
    }

    #[test]
    fn font_program_bytes_are_decoded() {
        let mut doc = Document::with_version("1.5");
        let program = doc.add_object(Stream::new(dictionary! {}, b"\x00\x01\x00\x00true".to_vec()));
        let not_stream = doc.add_object(dictionary! {});
        let pdf = PdfDocument {
            inner: doc,
            page_ids: Vec::new(),
        };
        assert_eq!(pdf.font_program(program).unwrap(), b"\x00\x01\x00\x00true");
        assert!(matches!(pdf.font_program(not_stream), Err(BackendError::Font(_))));
    }

    #[test]
    fn image_data_rejects_unsupported_filter() {
        let mut doc = Document::with_version("1.5");
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "Filter" => "JPXDecode",
            },
            vec![0],
        ));
        let pdf = PdfDocument {
            inner: doc,
            page_ids: Vec::new(),
        };
        assert!(matches!(pdf.image_data(id), Err(BackendError::Parse(_))));
    }
}
