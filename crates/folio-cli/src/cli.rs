use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Split a markdown book into one file per chapter, guided by its table of
/// contents.
#[derive(Debug, Parser)]
#[command(name = "chapter-splitter", about, version)]
pub struct SplitterArgs {
    /// Path to the markdown book
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory for the chapter files
    #[arg(short, long = "out", value_name = "DIR", default_value = "chapters")]
    pub out: PathBuf,

    /// Maximum line distance between entries of one table of contents
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub toc_gap: usize,

    /// Minimum similarity (0-100) for a fuzzy heading match
    #[arg(long, value_name = "N", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: u8,

    /// Output format of the run report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log per-line and per-page detail
    #[arg(short, long)]
    pub verbose: bool,
}

/// Anchor chapter files to the pages of their source PDF and inject the
/// figures found there as SVG or PNG assets.
#[derive(Debug, Parser)]
#[command(name = "visual-injector", about, version)]
pub struct InjectorArgs {
    /// Path to the source PDF
    #[arg(value_name = "PDF")]
    pub pdf: PathBuf,

    /// Directory holding the NN_Title.md chapter files
    #[arg(value_name = "MD_DIR")]
    pub md_dir: PathBuf,

    /// Output directory for chapters and assets
    #[arg(short, long = "out", value_name = "DIR", default_value = "rag_ready_book")]
    pub out: PathBuf,

    /// Always rasterize figures to PNG
    #[arg(long)]
    pub no_svg: bool,

    /// Similarity (0-100) a page must exceed to anchor a chapter
    #[arg(long, value_name = "N", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: u8,

    /// Resolution of rasterized figures
    #[arg(long, value_name = "N", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(1..=2400))]
    pub dpi: u32,

    /// Output format of the run report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log per-page and per-candidate detail
    #[arg(short, long)]
    pub verbose: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
