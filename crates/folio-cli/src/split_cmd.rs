use folio::{ChapterSplitter, SplitOptions, SplitReport};

use crate::cli::{OutputFormat, SplitterArgs};

pub fn run(args: &SplitterArgs) -> Result<(), i32> {
    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        return Err(1);
    }

    let options = SplitOptions {
        toc_gap: args.toc_gap,
        threshold: args.threshold,
        ..SplitOptions::default()
    };
    let report = ChapterSplitter::new(&args.input, &args.out)
        .with_options(options)
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

fn render_text(report: &SplitReport, out_dir: &str) -> String {
    let mut text = format!(
        "Elected TOC at line {}\nSaved {} files to {out_dir}\n",
        report.elected_toc_line,
        report.chapters.len()
    );
    for chapter in &report.chapters {
        text.push_str(&format!(
            "  {} (lines {}-{})\n",
            chapter.filename,
            chapter.start + 1,
            chapter.end
        ));
    }
    text
}
