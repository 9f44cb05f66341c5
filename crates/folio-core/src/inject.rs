//! Markdown image-link injection.

use crate::caption::{FigureBinding, FigureBindings, figure_reference_regex};

/// The markdown block inserted for a binding.
pub fn figure_link(binding: &FigureBinding) -> String {
    format!("\n\n![Figure {}]({})\n\n", binding.figure_id, binding.asset_path)
}

/// Insert an image link before the first reference to each bound figure.
///
/// Bindings are applied in order; a figure never referenced in `content`
/// is left out.
pub fn inject_figure_links(content: &str, bindings: &FigureBindings) -> String {
    let mut out = content.to_string();
    for binding in bindings.iter() {
        let Some(re) = figure_reference_regex(&binding.figure_id) else {
            continue;
        };
        let Some(pos) = re.find(&out).map(|m| m.start()) else {
            continue;
        };
        out.insert_str(pos, &figure_link(binding));
    }
    out
}
