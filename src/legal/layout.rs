//! Paginating layout
//!
//! Turns a [`Document`] into positioned lines on fixed-size pages. All
//! page-break decisions live here and read from one [`LayoutConfig`]:
//!
//! - paragraphs and bullets break between lines
//! - headings move to the next page unless one body line fits below them
//! - titles and signature blocks are never split
//!
//! Text width is estimated from an average glyph width rather than measured,
//! which is accurate enough for Helvetica body copy.

use serde::{Deserialize, Serialize};

use super::document::{Block, Document};
use super::error::{LegalError, LegalResult};

/// Page geometry and typography, in PDF points (1/72 inch)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    #[serde(default = "default_margin")]
    pub margin_top: f32,
    #[serde(default = "default_margin")]
    pub margin_bottom: f32,
    #[serde(default = "default_margin")]
    pub margin_left: f32,
    #[serde(default = "default_margin")]
    pub margin_right: f32,
    #[serde(default = "default_title_size")]
    pub title_size: f32,
    #[serde(default = "default_heading_size")]
    pub heading_size: f32,
    #[serde(default = "default_body_size")]
    pub body_size: f32,
    #[serde(default = "default_footer_size")]
    pub footer_size: f32,
    /// Line height as a multiple of font size
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    /// Gap after each block
    #[serde(default = "default_block_gap")]
    pub block_gap: f32,
    /// Indent for bullets and acknowledgments
    #[serde(default = "default_indent")]
    pub indent: f32,
    /// Average glyph width as a fraction of font size
    #[serde(default = "default_glyph_width")]
    pub avg_glyph_width: f32,
}

fn default_page_width() -> f32 {
    612.0 // US Letter
}

fn default_page_height() -> f32 {
    792.0
}

fn default_margin() -> f32 {
    54.0
}

fn default_title_size() -> f32 {
    18.0
}

fn default_heading_size() -> f32 {
    13.0
}

fn default_body_size() -> f32 {
    10.5
}

fn default_footer_size() -> f32 {
    8.0
}

fn default_line_spacing() -> f32 {
    1.4
}

fn default_block_gap() -> f32 {
    6.0
}

fn default_indent() -> f32 {
    18.0
}

fn default_glyph_width() -> f32 {
    0.5
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin_top: default_margin(),
            margin_bottom: default_margin(),
            margin_left: default_margin(),
            margin_right: default_margin(),
            title_size: default_title_size(),
            heading_size: default_heading_size(),
            body_size: default_body_size(),
            footer_size: default_footer_size(),
            line_spacing: default_line_spacing(),
            block_gap: default_block_gap(),
            indent: default_indent(),
            avg_glyph_width: default_glyph_width(),
        }
    }
}

impl LayoutConfig {
    /// Reject geometry that leaves no room for text
    pub fn validate(&self) -> LegalResult<()> {
        let usable_width = self.page_width - self.margin_left - self.margin_right - self.indent;
        let usable_height = self.page_height - self.margin_top - self.margin_bottom;

        if usable_width <= self.body_size * self.avg_glyph_width * 10.0 {
            return Err(LegalError::InvalidLayout(format!(
                "usable width {:.0}pt is too narrow",
                usable_width
            )));
        }
        if usable_height <= self.title_size * self.line_spacing * 4.0 {
            return Err(LegalError::InvalidLayout(format!(
                "usable height {:.0}pt is too short",
                usable_height
            )));
        }
        if self.line_spacing < 1.0 || self.avg_glyph_width <= 0.0 {
            return Err(LegalError::InvalidLayout(
                "line spacing must be >= 1 and glyph width positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn size_of(&self, style: TextStyle) -> f32 {
        match style {
            TextStyle::Title => self.title_size,
            TextStyle::Heading => self.heading_size,
            TextStyle::Body | TextStyle::Label => self.body_size,
            TextStyle::Footer => self.footer_size,
        }
    }

    fn line_height(&self, style: TextStyle) -> f32 {
        self.size_of(style) * self.line_spacing
    }

    /// Lowest y (from the top) a line may reach
    fn bottom_limit(&self) -> f32 {
        self.page_height - self.margin_bottom
    }

    fn max_chars(&self, style: TextStyle, indent: f32) -> usize {
        let width = self.page_width - self.margin_left - self.margin_right - indent;
        let glyph = self.size_of(style) * self.avg_glyph_width;
        ((width / glyph).floor() as usize).max(1)
    }
}

/// Typographic role of a line
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Title,
    Heading,
    Body,
    /// Bold body-size text (signature block captions)
    Label,
    Footer,
}

impl TextStyle {
    pub fn is_bold(&self) -> bool {
        matches!(self, TextStyle::Title | TextStyle::Heading | TextStyle::Label)
    }
}

/// A line of text at a fixed position
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacedLine {
    /// Left edge, points from the page's left side
    pub x: f32,
    /// Baseline, points from the page's top
    pub y: f32,
    pub text: String,
    pub style: TextStyle,
}

/// One laid-out page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub lines: Vec<PlacedLine>,
}

/// Greedy word wrap to at most `max_chars` per line
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();

        // Hard-split words longer than a full line
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            lines.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A line before it has a position
struct PendingLine {
    indent: f32,
    text: String,
    style: TextStyle,
}

/// Generic paginating renderer
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    config: LayoutConfig,
}

/// Accumulates pages while advancing a vertical cursor
struct Cursor<'a> {
    config: &'a LayoutConfig,
    pages: Vec<Page>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: vec![Page {
                number: 1,
                lines: Vec::new(),
            }],
            y: config.margin_top,
        }
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map(|p| p.lines.is_empty()).unwrap_or(true)
    }

    fn remaining(&self) -> f32 {
        self.config.bottom_limit() - self.y
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            lines: Vec::new(),
        });
        self.y = self.config.margin_top;
    }

    /// Start a new page unless `height` fits or the page is still empty
    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.page_is_empty() {
            self.new_page();
        }
    }

    fn place(&mut self, line: PendingLine) {
        let size = self.config.size_of(line.style);
        let height = self.config.line_height(line.style);
        let x = match line.style {
            TextStyle::Title => {
                let width = line.text.chars().count() as f32 * size * self.config.avg_glyph_width;
                ((self.config.page_width - width) / 2.0).max(self.config.margin_left)
            }
            _ => self.config.margin_left + line.indent,
        };

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                x,
                y: self.y + size,
                text: line.text,
                style: line.style,
            });
        }
        self.y += height;
    }

    fn gap(&mut self, height: f32) {
        self.y = (self.y + height).min(self.config.bottom_limit());
    }
}

impl Paginator {
    pub fn new(config: LayoutConfig) -> LegalResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out a document and stamp "Page n of m" footers
    pub fn paginate(&self, document: &Document) -> Vec<Page> {
        let config = &self.config;
        let mut cursor = Cursor::new(config);

        for block in &document.blocks {
            match block {
                Block::PageBreak => {
                    if !cursor.page_is_empty() {
                        cursor.new_page();
                    }
                }
                Block::Spacer { height } => {
                    if *height >= cursor.remaining() {
                        cursor.new_page();
                    } else {
                        cursor.gap(*height);
                    }
                }
                Block::Title { .. } | Block::Signature { .. } => {
                    // Atomic blocks
                    let lines = self.lines_for(block);
                    let height: f32 = lines.iter().map(|l| config.line_height(l.style)).sum();
                    cursor.ensure(height);
                    for line in lines {
                        cursor.place(line);
                    }
                    cursor.gap(config.block_gap);
                }
                Block::Heading { .. } => {
                    let lines = self.lines_for(block);
                    let height: f32 = lines.iter().map(|l| config.line_height(l.style)).sum();
                    // Keep with the first line of what follows
                    cursor.ensure(height + config.line_height(TextStyle::Body));
                    for line in lines {
                        cursor.place(line);
                    }
                }
                _ => {
                    for line in self.lines_for(block) {
                        cursor.ensure(config.line_height(line.style));
                        cursor.place(line);
                    }
                    cursor.gap(config.block_gap);
                }
            }
        }

        let mut pages = cursor.pages;
        // Drop a trailing page that only received a page break
        if pages.len() > 1 && pages.last().map(|p| p.lines.is_empty()).unwrap_or(false) {
            pages.pop();
        }

        let total = pages.len();
        for page in &mut pages {
            let text = format!("Page {} of {}", page.number, total);
            let width = text.len() as f32 * config.footer_size * config.avg_glyph_width;
            page.lines.push(PlacedLine {
                x: (config.page_width - width) / 2.0,
                y: config.page_height - config.margin_bottom / 2.0,
                text,
                style: TextStyle::Footer,
            });
        }

        pages
    }

    fn lines_for(&self, block: &Block) -> Vec<PendingLine> {
        let config = &self.config;
        let simple = |text: &str, style: TextStyle, indent: f32| -> Vec<PendingLine> {
            wrap(text, config.max_chars(style, indent))
                .into_iter()
                .map(|text| PendingLine {
                    indent,
                    text,
                    style,
                })
                .collect()
        };

        match block {
            Block::Title { text } => simple(text, TextStyle::Title, 0.0),
            Block::Heading { text } => simple(text, TextStyle::Heading, 0.0),
            Block::Paragraph { text } => simple(text, TextStyle::Body, 0.0),
            Block::Bullet { text } => prefixed("\u{2022} ", text, config),
            Block::Acknowledgment { checked, text } => {
                prefixed(if *checked { "[X] " } else { "[ ] " }, text, config)
            }
            Block::Signature { role, fields } => {
                let mut lines = vec![PendingLine {
                    indent: 0.0,
                    text: role.clone(),
                    style: TextStyle::Label,
                }];
                for (label, value) in fields {
                    lines.extend(simple(
                        &format!("{}: {}", label, value),
                        TextStyle::Body,
                        config.indent,
                    ));
                }
                lines
            }
            Block::Spacer { .. } | Block::PageBreak => Vec::new(),
        }
    }
}

/// Lines with a marker on the first line and hanging indent on the rest
fn prefixed(marker: &str, text: &str, config: &LayoutConfig) -> Vec<PendingLine> {
    let max = config.max_chars(TextStyle::Body, config.indent);
    let marker_len = marker.chars().count();
    wrap(text, max.saturating_sub(marker_len).max(1))
        .into_iter()
        .enumerate()
        .map(|(i, line)| PendingLine {
            indent: config.indent,
            text: if i == 0 {
                format!("{}{}", marker, line)
            } else {
                format!("{}{}", " ".repeat(marker_len), line)
            },
            style: TextStyle::Body,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator() -> Paginator {
        Paginator::new(LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn test_single_page_has_footer() {
        let doc = Document::new("Short").paragraph("One paragraph.");
        let pages = paginator().paginate(&doc);
        assert_eq!(pages.len(), 1);
        let footer = pages[0].lines.last().unwrap();
        assert_eq!(footer.text, "Page 1 of 1");
        assert_eq!(footer.style, TextStyle::Footer);
    }

    #[test]
    fn test_long_document_paginates_within_margins() {
        let config = LayoutConfig::default();
        let mut doc = Document::new("Long");
        for i in 0..120 {
            doc = doc.paragraph(format!("Paragraph {} with enough words to take a line.", i));
        }
        let pages = paginator().paginate(&doc);
        assert!(pages.len() > 1);

        for page in &pages {
            for line in page.lines.iter().filter(|l| l.style != TextStyle::Footer) {
                assert!(line.y <= config.page_height - config.margin_bottom);
                assert!(line.y >= config.margin_top);
            }
            let footer = page.lines.last().unwrap();
            assert_eq!(
                footer.text,
                format!("Page {} of {}", page.number, pages.len())
            );
        }
    }

    #[test]
    fn test_signature_block_not_split() {
        let mut doc = Document::new("Signatures");
        // Fill most of the first page
        for _ in 0..40 {
            doc = doc.paragraph("Filler line.");
        }
        let fields: Vec<(String, String)> = ["Name", "Email", "Location", "Signature", "Date"]
            .iter()
            .map(|l| (l.to_string(), "value".to_string()))
            .collect();
        doc = doc.signature("Company", fields);

        let pages = paginator().paginate(&doc);
        let page_of = |text: &str| {
            pages
                .iter()
                .find(|p| p.lines.iter().any(|l| l.text.starts_with(text)))
                .map(|p| p.number)
        };
        assert_eq!(page_of("Company"), page_of("Date:"));
    }

    #[test]
    fn test_heading_not_orphaned() {
        let config = LayoutConfig::default();
        let body_height = config.body_size * config.line_spacing;
        let usable = config.page_height - config.margin_top - config.margin_bottom;
        let title_height = config.title_size * config.line_spacing + config.block_gap;
        let per_para = body_height + config.block_gap;
        // Leave room for the heading but not for a body line after it
        let count = ((usable - title_height - config.heading_size * config.line_spacing)
            / per_para)
            .floor() as usize;

        let mut doc = Document::new("Orphans");
        for _ in 0..count {
            doc = doc.paragraph("x");
        }
        doc = doc.heading("Section").paragraph("Body after heading.");

        let pages = paginator().paginate(&doc);
        let heading_page = pages
            .iter()
            .find(|p| p.lines.iter().any(|l| l.text == "Section"))
            .unwrap();
        assert!(heading_page
            .lines
            .iter()
            .any(|l| l.text == "Body after heading."));
    }

    #[test]
    fn test_page_break() {
        let doc = Document::new("Breaks")
            .paragraph("first")
            .page_break()
            .page_break()
            .paragraph("second")
            .page_break();
        let pages = paginator().paginate(&doc);
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let config = LayoutConfig {
            margin_left: 300.0,
            margin_right: 300.0,
            ..Default::default()
        };
        assert!(matches!(
            Paginator::new(config),
            Err(LegalError::InvalidLayout(_))
        ));
    }
}
