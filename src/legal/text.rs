//! Plain-text renderer
//!
//! Uses the same pagination as the PDF output so page numbers agree. Lines
//! are indented by their x offset and pages are separated by a form feed.

use super::layout::{LayoutConfig, Page, TextStyle};

/// Render laid-out pages as UTF-8 text
pub fn render(pages: &[Page], config: &LayoutConfig) -> Vec<u8> {
    let glyph = config.body_size * config.avg_glyph_width;
    let mut out = String::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push('\u{c}');
            out.push('\n');
        }
        for line in &page.lines {
            if line.style == TextStyle::Footer {
                out.push('\n');
            }
            let columns = ((line.x - config.margin_left).max(0.0) / glyph).round() as usize;
            out.push_str(&" ".repeat(columns));
            out.push_str(&line.text);
            out.push('\n');
        }
    }

    out.into_bytes()
}
