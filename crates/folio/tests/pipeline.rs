//! End-to-end tests of the splitter and the injector on synthesised books.

mod common;

use std::fs;

use folio::{
    ChapterSplitter, CorpusError, InjectOptions, SplitOptions, VisualInjector, VisualKind,
};

#[test]
fn injector_binds_vector_and_raster_figures() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, common::two_chapter_book()).unwrap();
    let md_dir = dir.path().join("chapters");
    common::write_chapters(&md_dir);
    let out = dir.path().join("rag_ready_book");

    let report = VisualInjector::new(&pdf, &md_dir, &out).run().unwrap();

    let spans: Vec<(u32, usize, usize)> = report
        .chapters
        .iter()
        .map(|c| (c.mapping.number, c.mapping.start, c.mapping.end))
        .collect();
    assert_eq!(spans, [(1, 12, 15), (2, 15, 16)]);
    assert_eq!(report.figure_count(), 2);

    let intro = &report.chapters[0].figures[0];
    assert_eq!(intro.figure_id, "1.1");
    assert_eq!(intro.asset_path, "assets/fig_1_1.svg");
    assert_eq!(intro.kind, VisualKind::Vector);
    assert_eq!(intro.page, 12);
    let svg = fs::read_to_string(out.join("assets/fig_1_1.svg")).unwrap();
    assert!(svg.contains("<path"));

    // The photo overlaps a placed image, so it cannot be exported as SVG.
    let setup = &report.chapters[1].figures[0];
    assert_eq!(setup.asset_path, "assets/fig_2_1.png");
    assert_eq!(setup.kind, VisualKind::Raster);
    let png = fs::read(out.join("assets/fig_2_1.png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    assert!(!out.join("assets/fig_2_1.svg").exists());

    assert_eq!(
        fs::read_to_string(out.join("01_Intro.md")).unwrap(),
        "# Intro\n\nAs \n\n![Figure 1.1](assets/fig_1_1.svg)\n\nFigure 1.1 shows, boxes are blue.\n"
    );
    assert_eq!(
        fs::read_to_string(out.join("02_Setup.md")).unwrap(),
        "# Setup\n\nSee \n\n![Figure 2.1](assets/fig_2_1.png)\n\nFig. 2.1 for the photo.\n"
    );
}

#[test]
fn no_svg_rasterizes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, common::two_chapter_book()).unwrap();
    let md_dir = dir.path().join("chapters");
    common::write_chapters(&md_dir);
    let out = dir.path().join("out");

    let options = InjectOptions {
        use_svg: false,
        ..InjectOptions::default()
    };
    let report = VisualInjector::new(&pdf, &md_dir, &out)
        .with_options(options)
        .run()
        .unwrap();

    let kinds: Vec<VisualKind> = report
        .chapters
        .iter()
        .flat_map(|c| c.figures.iter().map(|f| f.kind))
        .collect();
    assert_eq!(kinds, [VisualKind::Raster, VisualKind::Raster]);
    assert!(out.join("assets/fig_1_1.png").exists());
    assert!(!out.join("assets/fig_1_1.svg").exists());
}

#[test]
fn unanchored_chapters_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, common::two_chapter_book()).unwrap();
    let md_dir = dir.path().join("chapters");
    common::write_chapters(&md_dir);
    fs::write(md_dir.join("03_Quantum_Widgets.md"), "# Quantum Widgets\n").unwrap();
    let out = dir.path().join("out");

    let report = VisualInjector::new(&pdf, &md_dir, &out).run().unwrap();

    assert_eq!(report.chapters.len(), 2);
    assert!(out.join("assets").is_dir());
    assert!(!out.join("03_Quantum_Widgets.md").exists());
}

#[test]
fn figure_is_bound_once_per_chapter() {
    let dir = tempfile::tempdir().unwrap();
    let mut pages: Vec<Vec<u8>> = (0..16).map(|_| common::filler_page()).collect();
    pages[11] = common::title_page("Intro");
    pages[12] = common::vector_figure_page("Intro", "Figure 1.1 First");
    pages[13] = common::image_figure_page("Later", "Figure 1.1 Again");
    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, common::book_pdf(&pages)).unwrap();
    let md_dir = dir.path().join("chapters");
    fs::create_dir_all(&md_dir).unwrap();
    fs::write(md_dir.join("01_Intro.md"), common::INTRO_MD).unwrap();
    let out = dir.path().join("out");

    let report = VisualInjector::new(&pdf, &md_dir, &out).run().unwrap();

    assert_eq!(report.chapters.len(), 1);
    let figures = &report.chapters[0].figures;
    assert_eq!(figures.len(), 1);
    assert_eq!(figures[0].page, 12);
    assert_eq!(figures[0].kind, VisualKind::Vector);
}

#[test]
fn unreadable_pdf_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, b"not a pdf").unwrap();
    let md_dir = dir.path().join("chapters");
    common::write_chapters(&md_dir);
    let out = dir.path().join("out");

    let err = VisualInjector::new(&pdf, &md_dir, &out).run().unwrap_err();
    assert!(matches!(err, CorpusError::Pdf(_)));
    assert!(!out.exists());
}

#[test]
fn missing_pdf_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = VisualInjector::new(
        dir.path().join("absent.pdf"),
        dir.path(),
        dir.path().join("out"),
    )
    .run()
    .unwrap_err();
    assert!(matches!(err, CorpusError::Io(_)));
}

#[test]
fn splitter_then_injector() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = String::from("Contents\nChapter 1: Intro, 13\nChapter 2: Setup, 16\n");
    for i in 0..20 {
        book.push_str(&format!("front {i}\n"));
    }
    book.push_str("# Chapter 1\n");
    book.push_str(common::INTRO_MD);
    book.push_str("# Chapter 2\n");
    book.push_str(common::SETUP_MD);
    let input = dir.path().join("book.md");
    fs::write(&input, &book).unwrap();
    let chapters = dir.path().join("chapters");

    let split = ChapterSplitter::new(&input, &chapters)
        .with_options(SplitOptions::default())
        .run()
        .unwrap();
    assert_eq!(split.elected_toc_line, 2);
    assert!(chapters.join("01_Intro.md").exists());
    assert!(chapters.join("02_Setup.md").exists());

    let pdf = dir.path().join("book.pdf");
    fs::write(&pdf, common::two_chapter_book()).unwrap();
    let out = dir.path().join("out");
    let report = VisualInjector::new(&pdf, &chapters, &out).run().unwrap();

    // The front matter never reaches the search floor on a 16 page book.
    let numbers: Vec<u32> = report.chapters.iter().map(|c| c.mapping.number).collect();
    assert_eq!(numbers, [1, 2]);
    let intro = fs::read_to_string(out.join("01_Intro.md")).unwrap();
    assert!(intro.starts_with("# Chapter 1\n# Intro\n"));
    assert!(intro.contains("![Figure 1.1](assets/fig_1_1.svg)"));
}
