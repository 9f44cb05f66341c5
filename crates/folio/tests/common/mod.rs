//! Shared builders for pipeline tests.
//!
//! Books are synthesised in memory with lopdf: every page shares one
//! Helvetica font (`/F1`) and an optional 2x2 RGB image (`/Im1`).

#![allow(dead_code)]

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};

/// Content stream for a page carrying only filler text.
pub fn filler_page() -> Vec<u8> {
    b"BT /F1 12 Tf 72 720 Td (filler) Tj ET".to_vec()
}

/// A chapter opening page: a large title and nothing else.
pub fn title_page(title: &str) -> Vec<u8> {
    format!("BT /F1 24 Tf 72 720 Td ({title}) Tj ET").into_bytes()
}

/// A titled page with a blue filled rectangle and a caption below it.
///
/// The rectangle spans x 100..300 and y 400..550 in PDF space, i.e.
/// top 242, bottom 392 in page coordinates.
pub fn vector_figure_page(title: &str, caption: &str) -> Vec<u8> {
    format!(
        "BT /F1 24 Tf 72 720 Td ({title}) Tj ET\n\
         0 0 1 rg 100 400 200 150 re f\n\
         BT /F1 12 Tf 120 370 Td ({caption}) Tj ET"
    )
    .into_bytes()
}

/// A titled page with `/Im1` placed over x 100..250, y 400..500 and a
/// caption below it.
pub fn image_figure_page(title: &str, caption: &str) -> Vec<u8> {
    format!(
        "BT /F1 24 Tf 72 720 Td ({title}) Tj ET\n\
         q 150 0 0 100 100 400 cm /Im1 Do Q\n\
         BT /F1 12 Tf 120 370 Td ({caption}) Tj ET"
    )
    .into_bytes()
}

/// Build a PDF with one page per content stream.
pub fn book_pdf(pages: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 0],
    ));
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font },
        "XObject" => dictionary! { "Im1" => image },
    });

    let mut kids = Vec::new();
    for content in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
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

/// Sixteen pages: `Intro` with a vector figure on page 13 and `Setup` with
/// a raster figure on page 16 (1-based).
pub fn two_chapter_book() -> Vec<u8> {
    let mut pages: Vec<Vec<u8>> = (0..16).map(|_| filler_page()).collect();
    pages[12] = vector_figure_page("Intro", "Figure 1.1 A blue box");
    pages[15] = image_figure_page("Setup", "Fig. 2.1 A photo");
    book_pdf(&pages)
}

pub const INTRO_MD: &str = "# Intro\n\nAs Figure 1.1 shows, boxes are blue.\n";
pub const SETUP_MD: &str = "# Setup\n\nSee Fig. 2.1 for the photo.\n";

/// Write `01_Intro.md` and `02_Setup.md` into `dir`.
pub fn write_chapters(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("01_Intro.md"), INTRO_MD).unwrap();
    std::fs::write(dir.join("02_Setup.md"), SETUP_MD).unwrap();
}
