//! Declarative document model
//!
//! Templates describe *what* goes on the page as a list of blocks; the
//! [`Paginator`](super::layout::Paginator) decides *where*.

use serde::Serialize;

/// One unit of document content
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Centered document title
    Title { text: String },
    /// Section heading, never left alone at the bottom of a page
    Heading { text: String },
    /// Body text, may split across pages
    Paragraph { text: String },
    /// Indented bullet item
    Bullet { text: String },
    /// Checkbox line
    Acknowledgment { checked: bool, text: String },
    /// Signature block, always kept on one page
    Signature {
        role: String,
        fields: Vec<(String, String)>,
    },
    /// Vertical gap in points
    Spacer { height: f32 },
    /// Force a new page
    PageBreak,
}

/// A titled sequence of blocks
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            blocks: vec![Block::Title {
                text: title.clone(),
            }],
            title,
        }
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading { text: text.into() });
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph { text: text.into() });
        self
    }

    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks
            .extend(items.into_iter().map(|s| Block::Bullet { text: s.into() }));
        self
    }

    pub fn acknowledgment(mut self, checked: bool, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Acknowledgment {
            checked,
            text: text.into(),
        });
        self
    }

    pub fn signature(mut self, role: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.blocks.push(Block::Signature {
            role: role.into(),
            fields,
        });
        self
    }

    pub fn spacer(mut self, height: f32) -> Self {
        self.blocks.push(Block::Spacer { height });
        self
    }

    pub fn page_break(mut self) -> Self {
        self.blocks.push(Block::PageBreak);
        self
    }

    /// All text in the document, one block per line
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Title { text }
                | Block::Heading { text }
                | Block::Paragraph { text }
                | Block::Bullet { text } => {
                    out.push_str(text);
                    out.push('\n');
                }
                Block::Acknowledgment { checked, text } => {
                    out.push_str(if *checked { "[X] " } else { "[ ] " });
                    out.push_str(text);
                    out.push('\n');
                }
                Block::Signature { role, fields } => {
                    out.push_str(role);
                    out.push('\n');
                    for (label, value) in fields {
                        out.push_str(&format!("{}: {}\n", label, value));
                    }
                }
                Block::Spacer { .. } | Block::PageBreak => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_with_title() {
        let doc = Document::new("Test").paragraph("Body");
        assert_eq!(doc.blocks.len(), 2);
        assert!(matches!(doc.blocks[0], Block::Title { .. }));
    }

    #[test]
    fn test_plain_text() {
        let doc = Document::new("Agreement")
            .acknowledgment(true, "I agree")
            .acknowledgment(false, "I decline")
            .signature(
                "Company",
                vec![("Name".to_string(), "Acme".to_string())],
            );
        let text = doc.plain_text();
        assert!(text.contains("[X] I agree"));
        assert!(text.contains("[ ] I decline"));
        assert!(text.contains("Name: Acme"));
    }
}
