//! DOCX parsing into a small block model.
//!
//! Only what the conversions need is kept: paragraph text with bold/italic
//! runs, heading levels, and tables of paragraphs.

use crate::error::{ConversionError, Result};
use crate::html;
use docx_rs::*;

/// A run of text with inline emphasis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// A paragraph: an optional heading level and its spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Para {
    pub heading: Option<u8>,
    pub spans: Vec<Span>,
}

impl Para {
    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }
}

/// Top-level document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Para),
    /// Rows of cells, each cell a list of paragraphs.
    Table(Vec<Vec<Vec<Para>>>),
}

/// A parsed DOCX body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocxContent {
    pub blocks: Vec<Block>,
}

impl DocxContent {
    /// Parse DOCX bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let docx = read_docx(data)
            .map_err(|e| ConversionError::Encoding(format!("Failed to parse DOCX: {:?}", e)))?;

        let mut blocks = Vec::new();
        for child in docx.document.children.iter() {
            match child {
                DocumentChild::Paragraph(para) => {
                    blocks.push(Block::Paragraph(extract_paragraph(para)));
                }
                DocumentChild::Table(table) => {
                    blocks.push(Block::Table(extract_table(table)));
                }
                _ => {}
            }
        }

        Ok(Self { blocks })
    }

    /// Raw text: every paragraph, table cells included, followed by a blank
    /// line.
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        for para in self.paragraphs() {
            out.push_str(&para.text());
            out.push_str("\n\n");
        }
        out
    }

    fn paragraphs(&self) -> Vec<&Para> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(para) => out.push(para),
                Block::Table(rows) => out.extend(rows.iter().flatten().flatten()),
            }
        }
        out
    }

    /// Markup fragments: headings, paragraphs with `<strong>`/`<em>`, and
    /// tables. Empty paragraphs are dropped.
    pub fn to_html(&self) -> String {
        let mut fragments = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(para) => {
                    if !para.is_empty() {
                        fragments.push(paragraph_html(para));
                    }
                }
                Block::Table(rows) => fragments.push(table_html(rows)),
            }
        }
        fragments.join("\n    ")
    }
}

fn extract_paragraph(para: &docx_rs::Paragraph) -> Para {
    let mut out = Para::default();

    if let Some(ref style) = para.property.style {
        let style_id = &style.val;
        if style_id.starts_with("Heading") || style_id.starts_with("heading") {
            out.heading = style_id
                .chars()
                .last()
                .and_then(|c| c.to_digit(10))
                .map(|d| d.clamp(1, 6) as u8);
        }
    }

    collect_spans(&para.children, &mut out.spans);
    out
}

fn collect_spans(children: &[ParagraphChild], spans: &mut Vec<Span>) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                let span = extract_run(run);
                if !span.text.is_empty() {
                    spans.push(span);
                }
            }
            ParagraphChild::Hyperlink(link) => collect_spans(&link.children, spans),
            _ => {}
        }
    }
}

fn extract_run(run: &docx_rs::Run) -> Span {
    let mut span = Span {
        bold: run.run_property.bold.is_some(),
        italic: run.run_property.italic.is_some(),
        ..Default::default()
    };

    for child in &run.children {
        match child {
            RunChild::Text(t) => span.text.push_str(&t.text),
            RunChild::Tab(_) => span.text.push('\t'),
            RunChild::Break(_) => span.text.push('\n'),
            _ => {}
        }
    }

    span
}

fn extract_table(table: &docx_rs::Table) -> Vec<Vec<Vec<Para>>> {
    let mut rows = Vec::new();
    for table_child in &table.rows {
        let TableChild::TableRow(row) = table_child;
        let mut cells = Vec::new();
        for row_child in &row.cells {
            let TableRowChild::TableCell(cell) = row_child;
            let mut paragraphs = Vec::new();
            for content in &cell.children {
                if let TableCellContent::Paragraph(para) = content {
                    paragraphs.push(extract_paragraph(para));
                }
            }
            cells.push(paragraphs);
        }
        rows.push(cells);
    }
    rows
}

fn spans_html(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        let mut text = html::escape(&span.text).replace('\n', "<br>");
        if span.italic {
            text = format!("<em>{}</em>", text);
        }
        if span.bold {
            text = format!("<strong>{}</strong>", text);
        }
        out.push_str(&text);
    }
    out
}

fn paragraph_html(para: &Para) -> String {
    match para.heading {
        Some(level) => format!("<h{0}>{1}</h{0}>", level, spans_html(&para.spans)),
        None => format!("<p>{}</p>", spans_html(&para.spans)),
    }
}

fn table_html(rows: &[Vec<Vec<Para>>]) -> String {
    let mut out = String::from("<table>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            for para in cell.iter().filter(|p| !p.is_empty()) {
                out.push_str(&paragraph_html(para));
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
    out
}
