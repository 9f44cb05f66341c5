use folio::{AnchorOptions, InjectOptions, InjectReport, RasterOptions, VisualInjector, VisualKind};

use crate::cli::{InjectorArgs, OutputFormat};

pub fn run(args: &InjectorArgs) -> Result<(), i32> {
    if !args.pdf.exists() {
        eprintln!("Error: file not found: {}", args.pdf.display());
        return Err(1);
    }
    if !args.md_dir.is_dir() {
        eprintln!("Error: directory not found: {}", args.md_dir.display());
        return Err(1);
    }

    let report = VisualInjector::new(&args.pdf, &args.md_dir, &args.out)
        .with_options(options_from(args))
        .run()
        .map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report, &args.out.display().to_string())),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|e| {
                eprintln!("Error: {e}");
                1
            })?;
            println!("{json}");
        }
    }
    Ok(())
}

fn options_from(args: &InjectorArgs) -> InjectOptions {
    InjectOptions {
        use_svg: !args.no_svg,
        anchor: AnchorOptions {
            threshold: args.threshold,
            ..AnchorOptions::default()
        },
        raster: RasterOptions {
            dpi: f64::from(args.dpi),
            ..RasterOptions::default()
        },
        ..InjectOptions::default()
    }
}

fn render_text(report: &InjectReport, out_dir: &str) -> String {
    let mut text = String::new();
    for chapter in &report.chapters {
        let m = &chapter.mapping;
        text.push_str(&format!(
            "Ch {} anchored to PDF page {} -> {}\n",
            m.number,
            m.start + 1,
            m.filename
        ));
        for figure in &chapter.figures {
            let kind = match figure.kind {
                VisualKind::Vector => "SVG",
                VisualKind::Raster => "PNG",
            };
            text.push_str(&format!(
                "  {kind} Found: Fig {} on page {} -> {}\n",
                figure.figure_id,
                figure.page + 1,
                figure.asset_path
            ));
        }
    }
    text.push_str(&format!(
        "Done! {} chapters, {} figures in {out_dir}\n",
        report.chapters.len(),
        report.figure_count()
    ));
    text
}
