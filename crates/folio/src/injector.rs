//! Figure extraction from the source PDF into chapter markdown.
//!
//! Each chapter file is anchored to the PDF page where its title appears.
//! On every page of a chapter's range, figure captions are located and
//! bound to the closest visual candidate. The visual is exported as SVG
//! when it can be drawn faithfully as vectors, otherwise rendered to PNG.
//! A link to each asset is then inserted before the figure's first
//! mention in the chapter text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use folio_core::naming::figure_asset_stem;
use folio_core::{
    AlignOptions, AnchorOptions, BBox, CandidateOptions, ChapterFile, ChapterMapping, CorpusError,
    FigureBinding, FigureBindings, VectorExport, VisualCandidate, VisualKind, export_region,
    extract_candidates, find_figure_ids, inject_figure_links, locate_caption,
    resolve_page_anchors, select_candidate,
};
use folio_parse::{ExtractOptions, ObjectId, PageContent, PdfDocument};
use folio_raster::{
    PlacedGlyph, PlacedRaster, RasterOptions, Scene, decode_image, render_region,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Directory under the output root that receives extracted visuals.
pub const ASSETS_DIR: &str = "assets";

/// Options for a figure injection run.
#[derive(Debug, Clone)]
pub struct InjectOptions {
    /// Try SVG export before falling back to PNG. Default is `true`.
    pub use_svg: bool,
    pub anchor: AnchorOptions,
    pub candidates: CandidateOptions,
    pub align: AlignOptions,
    pub raster: RasterOptions,
    pub extract: ExtractOptions,
}

impl Default for InjectOptions {
    fn default() -> Self {
        Self {
            use_svg: true,
            anchor: AnchorOptions::default(),
            candidates: CandidateOptions::default(),
            align: AlignOptions::default(),
            raster: RasterOptions::default(),
            extract: ExtractOptions::default(),
        }
    }
}

/// One written chapter and the figures bound for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterReport {
    /// 0-based half-open page range of the chapter.
    pub mapping: ChapterMapping,
    pub figures: Vec<FigureBinding>,
}

/// Outcome of an injection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectReport {
    pub chapters: Vec<ChapterReport>,
}

impl InjectReport {
    /// Figures bound across all chapters.
    pub fn figure_count(&self) -> usize {
        self.chapters.iter().map(|c| c.figures.len()).sum()
    }
}

/// Anchors chapter files to a PDF and injects the figures found there.
#[derive(Debug, Clone)]
pub struct VisualInjector {
    pdf: PathBuf,
    md_dir: PathBuf,
    output_dir: PathBuf,
    options: InjectOptions,
}

impl VisualInjector {
    pub fn new(
        pdf: impl Into<PathBuf>,
        md_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pdf: pdf.into(),
            md_dir: md_dir.into(),
            output_dir: output_dir.into(),
            options: InjectOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InjectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &InjectOptions {
        &self.options
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the whole pipeline.
    ///
    /// Only an unreadable PDF or chapter directory, or a failure to write
    /// the output, is fatal. Problems with single pages, images or figures
    /// are logged and skipped.
    pub fn run(&self) -> Result<InjectReport, CorpusError> {
        let doc = PdfDocument::open(&self.pdf).map_err(|e| match CorpusError::from(e) {
            CorpusError::Io(msg) => CorpusError::Io(format!("{}: {msg}", self.pdf.display())),
            other => other,
        })?;
        let chapter_files = list_chapter_files(&self.md_dir)?;
        debug!(
            pages = doc.page_count(),
            chapters = chapter_files.len(),
            "loaded inputs"
        );

        let assets_dir = self.output_dir.join(ASSETS_DIR);
        fs::create_dir_all(&assets_dir)
            .map_err(|e| CorpusError::Io(format!("{}: {e}", assets_dir.display())))?;

        let pages = self.extract_pages(&doc);
        let page_texts: Vec<String> = pages
            .iter()
            .map(|p| p.as_ref().map(|p| p.text().to_lowercase()).unwrap_or_default())
            .collect();
        let mappings = resolve_page_anchors(&chapter_files, &page_texts, &self.options.anchor);

        let mut report = InjectReport::default();
        for mapping in mappings {
            info!(
                chapter = mapping.number,
                page = mapping.start + 1,
                "chapter anchored to PDF page"
            );
            let source = self.md_dir.join(&mapping.filename);
            let content = match fs::read_to_string(&source) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %source.display(), error = %e, "skipping unreadable chapter");
                    continue;
                }
            };

            let bindings = self.bind_figures(&doc, &pages, &mapping, &assets_dir);
            let target = self.output_dir.join(&mapping.filename);
            fs::write(&target, inject_figure_links(&content, &bindings))
                .map_err(|e| CorpusError::Io(format!("{}: {e}", target.display())))?;
            info!(file = %mapping.filename, figures = bindings.len(), "saved chapter");

            report.chapters.push(ChapterReport {
                mapping,
                figures: bindings.into_vec(),
            });
        }
        Ok(report)
    }

    /// Interpret every page. Pages that fail come back as `None`.
    fn extract_pages(&self, doc: &PdfDocument) -> Vec<Option<PageContent>> {
        (0..doc.page_count())
            .map(|index| match doc.extract_page(index, &self.options.extract) {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(page = index + 1, error = %e, "page could not be interpreted");
                    None
                }
            })
            .collect()
    }

    fn bind_figures(
        &self,
        doc: &PdfDocument,
        pages: &[Option<PageContent>],
        mapping: &ChapterMapping,
        assets_dir: &Path,
    ) -> FigureBindings {
        let mut bindings = FigureBindings::new();
        for index in mapping.start..mapping.end {
            let Some(page) = pages.get(index).and_then(Option::as_ref) else {
                continue;
            };
            let layout = page.layout();
            let figure_ids = find_figure_ids(layout.text());
            if figure_ids.is_empty() {
                continue;
            }

            let image_boxes = page.image_boxes();
            let candidates =
                extract_candidates(&image_boxes, &page.path_boxes(), &self.options.candidates);
            debug!(
                page = index + 1,
                references = figure_ids.len(),
                candidates = candidates.len(),
                "scanning page"
            );

            // Decoding images is only worth it once a figure needs a raster.
            let mut scene: Option<Scene> = None;
            for figure_id in figure_ids {
                if bindings.contains(&figure_id) {
                    continue;
                }
                let Some(caption) = locate_caption(&layout, &page.chars, &figure_id) else {
                    debug!(figure = %figure_id, page = index + 1, "caption text not located");
                    continue;
                };
                let Some(candidate) = select_candidate(&caption, &candidates, &self.options.align)
                else {
                    debug!(figure = %figure_id, page = index + 1, "no visual candidate");
                    continue;
                };

                let export = FigureExport {
                    doc,
                    page,
                    image_boxes: &image_boxes,
                    assets_dir,
                };
                if let Some(binding) = self.export_figure(&export, candidate, &figure_id, &mut scene)
                {
                    info!(
                        figure = %binding.figure_id,
                        asset = %binding.asset_path,
                        chapter = %mapping.filename,
                        "found figure"
                    );
                    bindings.insert(binding);
                }
            }
        }
        bindings
    }

    /// Write the asset for one figure. `None` leaves the figure unbound.
    fn export_figure(
        &self,
        export: &FigureExport<'_>,
        candidate: &VisualCandidate,
        figure_id: &str,
        scene: &mut Option<Scene>,
    ) -> Option<FigureBinding> {
        let stem = figure_asset_stem(figure_id);
        let page = export.page;

        if self.options.use_svg {
            match export_region(candidate.bbox, &page.paths, &page.chars, export.image_boxes) {
                VectorExport::Markup(svg) => {
                    let name = format!("{stem}.svg");
                    match fs::write(export.assets_dir.join(&name), svg) {
                        Ok(()) => return Some(binding(figure_id, &name, VisualKind::Vector, page)),
                        Err(e) => warn!(figure = %figure_id, error = %e, "could not write SVG"),
                    }
                }
                VectorExport::Rejected(reason) => {
                    debug!(figure = %figure_id, %reason, "vector export rejected, rasterizing");
                }
            }
        }

        let scene = scene.get_or_insert_with(|| page_scene(export.doc, page));
        let png = match render_region(candidate.bbox, scene, &self.options.raster) {
            Ok(png) => png,
            Err(e) => {
                warn!(figure = %figure_id, page = page.index + 1, error = %e, "rasterization failed");
                return None;
            }
        };
        let name = format!("{stem}.png");
        if let Err(e) = fs::write(export.assets_dir.join(&name), png) {
            warn!(figure = %figure_id, error = %e, "could not write PNG");
            return None;
        }
        Some(binding(figure_id, &name, VisualKind::Raster, page))
    }
}

/// Per-page context shared by the figures exported from it.
struct FigureExport<'a> {
    doc: &'a PdfDocument,
    page: &'a PageContent,
    image_boxes: &'a [BBox],
    assets_dir: &'a Path,
}

fn binding(figure_id: &str, file_name: &str, kind: VisualKind, page: &PageContent) -> FigureBinding {
    FigureBinding {
        figure_id: figure_id.to_string(),
        asset_path: format!("{ASSETS_DIR}/{file_name}"),
        kind,
        page: page.index,
    }
}

/// Paths, decodable images and visible glyphs of a page, ready to
/// rasterize.
fn page_scene(doc: &PdfDocument, page: &PageContent) -> Scene {
    let mut scene = Scene::new(page.width, page.height);
    scene.paths = page.paths.clone();

    // Each embedded program is parsed once; `None` marks one that failed.
    let mut fonts: HashMap<ObjectId, Option<usize>> = HashMap::new();
    for (ch, paint) in page.chars.iter().zip(&page.glyphs) {
        if !paint.visible {
            continue;
        }
        let font = paint.font_program.and_then(|id| {
            *fonts
                .entry(id)
                .or_insert_with(|| embed_font(doc, &mut scene, id, page.index))
        });
        scene.glyphs.push(PlacedGlyph {
            text: ch.text.clone(),
            bbox: ch.bbox,
            size: ch.size,
            color: paint.color,
            font,
            glyph_id: paint.glyph_id,
        });
    }

    for image in &page.images {
        let Some(id) = image.object_id else {
            warn!(page = page.index + 1, image = %image.name, "skipping image without object");
            continue;
        };
        let decoded = doc
            .image_data(id)
            .map_err(|e| e.to_string())
            .and_then(|data| decode_image(&data).map_err(|e| e.to_string()));
        match decoded {
            Ok(pixels) => scene.images.push(PlacedRaster {
                bbox: image.bbox,
                pixels,
            }),
            Err(e) => {
                warn!(page = page.index + 1, image = %image.name, error = %e, "skipping undecodable image");
            }
        }
    }
    scene
}

fn embed_font(doc: &PdfDocument, scene: &mut Scene, id: ObjectId, page: usize) -> Option<usize> {
    let loaded = doc
        .font_program(id)
        .map_err(|e| e.to_string())
        .and_then(|program| scene.add_font(&program).map_err(|e| e.to_string()));
    match loaded {
        Ok(index) => Some(index),
        Err(e) => {
            warn!(page = page + 1, font = ?id, error = %e, "drawing glyphs with the fallback face");
            None
        }
    }
}

/// Chapter files in `md_dir`, sorted by file name.
///
/// Markdown files without a two-digit chapter prefix are ignored.
fn list_chapter_files(md_dir: &Path) -> Result<Vec<ChapterFile>, CorpusError> {
    let entries =
        fs::read_dir(md_dir).map_err(|e| CorpusError::Io(format!("{}: {e}", md_dir.display())))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        // Follows symlinks, so linked chapter files are listed too.
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();

    Ok(names
        .iter()
        .filter(|name| name.ends_with(".md"))
        .filter_map(|name| {
            let file = ChapterFile::from_filename(name);
            if file.is_none() {
                warn!(file = %name, "ignoring markdown file without chapter number");
            }
            file
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = InjectOptions::default();
        assert!(opts.use_svg);
        assert_eq!(opts.anchor.threshold, 85);
        assert_eq!(opts.raster.dpi, 300.0);
        assert_eq!(opts.extract.max_recursion_depth, 10);
    }

    #[test]
    fn lists_only_numbered_markdown_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "02_Setup.md",
            "00_Front_Matter.md",
            "01_Intro.md",
            "notes.md",
            "03_Data.txt",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("04_Dir.md")).unwrap();

        let files = list_chapter_files(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["00_Front_Matter.md", "01_Intro.md", "02_Setup.md"]);
        assert_eq!(files[1].number, 1);
        assert_eq!(files[1].title_hint, "intro");
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_chapter_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let md_dir = dir.path().join("chapters");
        fs::create_dir(&md_dir).unwrap();
        let target = dir.path().join("intro_draft.md");
        fs::write(&target, "# Intro\n").unwrap();
        std::os::unix::fs::symlink(&target, md_dir.join("01_Intro.md")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.md"), md_dir.join("02_Gone.md")).unwrap();

        let files = list_chapter_files(&md_dir).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["01_Intro.md"]);
    }

    fn one_page_pdf(content: &[u8]) -> PdfDocument {
        use lopdf::{Document, Object, Stream, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        PdfDocument::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn scene_keeps_visible_glyphs_only() {
        let pdf = one_page_pdf(b"BT /F1 12 Tf 1 0 0 rg 72 700 Td (Hi) Tj 3 Tr (ocr) Tj ET");
        let page = pdf.extract_page(0, &ExtractOptions::default()).unwrap();
        assert_eq!(page.chars.len(), 5);

        let scene = page_scene(&pdf, &page);
        let texts: Vec<&str> = scene.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(texts, ["H", "i"]);
        assert_eq!(scene.glyphs[0].color, folio_core::Color::Rgb(1.0, 0.0, 0.0));
        assert_eq!(scene.glyphs[0].font, None);
        assert_eq!(scene.glyphs[0].bbox, page.chars[0].bbox);
    }

    #[test]
    fn missing_chapter_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_chapter_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, CorpusError::Io(_)));
    }

    #[test]
    fn report_counts_figures() {
        let mapping = ChapterMapping {
            number: 1,
            filename: "01_Intro.md".to_string(),
            start: 0,
            end: 2,
        };
        let figure = FigureBinding {
            figure_id: "1.1".to_string(),
            asset_path: "assets/fig_1_1.svg".to_string(),
            kind: VisualKind::Vector,
            page: 0,
        };
        let report = InjectReport {
            chapters: vec![ChapterReport {
                mapping,
                figures: vec![figure],
            }],
        };
        assert_eq!(report.figure_count(), 1);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["chapters"][0]["figures"][0]["asset_path"], "assets/fig_1_1.svg");
    }
}
