//! Markdown book to chapter files.

use std::fs;
use std::path::{Path, PathBuf};

use folio_core::{ChapterMapping, CorpusError, SplitOptions, plan_split};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a split run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitReport {
    /// 1-based line of the first entry of the elected table of contents.
    pub elected_toc_line: usize,
    /// Written files with their 0-based half-open line ranges.
    pub chapters: Vec<ChapterMapping>,
}

/// Splits one markdown book into chapter files.
///
/// Nothing is written when no table of contents can be elected.
#[derive(Debug, Clone)]
pub struct ChapterSplitter {
    input: PathBuf,
    output_dir: PathBuf,
    options: SplitOptions,
}

impl ChapterSplitter {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            options: SplitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SplitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read the book, plan the split and write every chapter file.
    pub fn run(&self) -> Result<SplitReport, CorpusError> {
        let text = fs::read_to_string(&self.input)
            .map_err(|e| CorpusError::Io(format!("{}: {e}", self.input.display())))?;
        // Terminators stay on the lines so the files concatenate back to the input.
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        debug!(lines = lines.len(), input = %self.input.display(), "read book");

        let plan = plan_split(&lines, &self.options)?;
        let elected_toc_line = plan.elected.first().map_or(0, |c| c.position + 1);
        info!(
            line = elected_toc_line,
            entries = plan.elected.len(),
            "elected TOC sequence"
        );

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| CorpusError::Io(format!("{}: {e}", self.output_dir.display())))?;
        for chapter in &plan.chapters {
            let path = self.output_dir.join(&chapter.filename);
            fs::write(&path, lines[chapter.start..chapter.end].concat())
                .map_err(|e| CorpusError::Io(format!("{}: {e}", path.display())))?;
            info!(file = %chapter.filename, lines = chapter.len(), "saved chapter");
        }

        Ok(SplitReport {
            elected_toc_line,
            chapters: plan.chapters,
        })
    }
}
