//! File naming conventions shared by the splitter and the injector.
//!
//! Chapter files are named `NN_Sanitized_Title.md`; the splitter writes them
//! and the injector reads the number and title back out of the name.

use std::sync::LazyLock;

use regex::Regex;

/// Name of the synthetic chapter holding everything before the first heading.
pub const FRONT_MATTER_FILENAME: &str = "00_Front_Matter.md";

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid sanitize regex"));

/// Turn a title into a filesystem-safe token.
///
/// Runs of anything other than ASCII letters and digits become one `_`,
/// leading and trailing underscores are trimmed and the result is capped at
/// `max_len` characters.
pub fn sanitize(title: &str, max_len: usize) -> String {
    let replaced = NON_ALNUM_RE.replace_all(title, "_");
    let trimmed = replaced.trim_matches('_');
    // Only ASCII survives the replacement, so byte and char counts agree.
    trimmed[..trimmed.len().min(max_len)].to_string()
}

/// `NN_<sanitized title>.md`
pub fn chapter_filename(number: u32, title: &str, max_len: usize) -> String {
    format!("{number:02}_{}.md", sanitize(title, max_len))
}

/// Asset file stem for a figure id: `5.6` → `fig_5_6`.
pub fn figure_asset_stem(figure_id: &str) -> String {
    format!("fig_{}", figure_id.replace('.', "_"))
}

/// A chapter file recognised by its `NN_` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChapterFile {
    pub number: u32,
    /// Lower-cased title words recovered from the file name.
    pub title_hint: String,
    pub filename: String,
}

impl ChapterFile {
    /// Parse a chapter file name. Names that do not end in `.md` or do not
    /// start with two digits are not chapter files.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(".md")?;
        let prefix = stem.get(..2)?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = prefix.parse().ok()?;
        let title_hint = stem.get(3..).unwrap_or("").replace('_', " ").to_lowercase();
        Some(ChapterFile {
            number,
            title_hint,
            filename: filename.to_string(),
        })
    }
}
