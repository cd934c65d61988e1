//! Minimal PDF 1.4 writer
//!
//! Emits uncompressed text-only pages using the two standard Helvetica
//! faces, so no fonts are embedded. Object layout:
//!
//! ```text
//! 1        Catalog
//! 2        Pages
//! 3, 4     Helvetica, Helvetica-Bold
//! 5        Info
//! 6 + 2k   Page k
//! 7 + 2k   Content stream of page k
//! ```

use super::layout::{LayoutConfig, Page};

const FIRST_PAGE_OBJECT: usize = 6;

struct PdfWriter {
    buf: Vec<u8>,
    /// Byte offset of each object, indexed by object number - 1
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::with_capacity(16 * 1024);
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, number: usize, body: &str) {
        self.mark(number);
        self.push(&format!("{} 0 obj\n{}\nendobj\n", number, body));
    }

    fn stream(&mut self, number: usize, content: &str) {
        self.mark(number);
        self.push(&format!(
            "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            number,
            content.len(),
            content
        ));
    }

    fn mark(&mut self, number: usize) {
        if self.offsets.len() < number {
            self.offsets.resize(number, 0);
        }
        self.offsets[number - 1] = self.buf.len();
    }

    fn push(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for offset in &self.offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref_offset
        ));
        self.push(&xref);
        self.buf
    }
}

/// Encode text as a PDF literal string body in WinAnsi
///
/// Characters outside WinAnsiEncoding become `?`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => match win_ansi_byte(c) {
                Some(byte) => out.push_str(&format!("\\{:03o}", byte)),
                None => out.push('?'),
            },
        }
    }
    out
}

/// WinAnsiEncoding code for a non-ASCII character
fn win_ansi_byte(c: char) -> Option<u8> {
    let byte = match c {
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        _ => return None,
    };
    Some(byte)
}

fn content_stream(page: &Page, config: &LayoutConfig) -> String {
    let mut content = String::new();
    for line in &page.lines {
        let font = if line.style.is_bold() { "F2" } else { "F1" };
        let size = config.size_of(line.style);
        // PDF y grows upwards from the bottom edge
        let baseline = config.page_height - line.y;
        content.push_str(&format!(
            "BT /{} {:.1} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            font,
            size,
            line.x,
            baseline,
            escape_text(&line.text)
        ));
    }
    if content.ends_with('\n') {
        content.pop();
    }
    content
}

/// Render laid-out pages to PDF bytes
pub fn render(pages: &[Page], config: &LayoutConfig, title: &str) -> Vec<u8> {
    let mut writer = PdfWriter::new();

    let kids: Vec<String> = (0..pages.len())
        .map(|k| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * k))
        .collect();

    writer.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(
        2,
        &format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
    );
    writer.object(
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        4,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    writer.object(
        5,
        &format!(
            "<< /Title ({}) /Producer (Asset Safe) >>",
            escape_text(title)
        ),
    );

    for (k, page) in pages.iter().enumerate() {
        let page_object = FIRST_PAGE_OBJECT + 2 * k;
        writer.object(
            page_object,
            &format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                config.page_width,
                config.page_height,
                page_object + 1
            ),
        );
        writer.stream(page_object + 1, &content_stream(page, config));
    }

    writer.finish()
}
