//! Word wrapping and pagination for text rendered onto fixed-size pages.
//!
//! Measurement is character based: a line fits if its character count is
//! within the page's char budget. There is no font metric involved.

use crate::config::PageLayout;

/// Raw text split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    pub lines: Vec<String>,
}

impl TextDocument {
    /// Split text on newlines. A trailing `\r` is dropped from each line.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self { lines }
    }

    /// Wrap to the layout's char budget and paginate.
    pub fn layout(&self, layout: &PageLayout) -> Vec<Page> {
        let display = wrap(&self.lines, layout.char_budget());
        paginate(
            display,
            layout.page_height,
            layout.margin,
            layout.line_height(),
        )
    }
}

/// A line positioned on a page. `y` is the PDF baseline, measured from the
/// bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub y: f32,
}

/// One output page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// Greedy word wrap.
///
/// Lines within budget pass through unchanged, empty lines included. Longer
/// lines are packed word by word; a single word longer than the budget is
/// emitted whole on its own line.
pub fn wrap<S: AsRef<str>>(lines: &[S], char_budget: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let line = line.as_ref();
        if line.chars().count() <= char_budget {
            out.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;
        let mut emitted = false;

        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= char_budget {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                out.push(std::mem::take(&mut current));
                emitted = true;
                current.push_str(word);
                current_len = word_len;
            }
        }

        if !current.is_empty() || !emitted {
            out.push(current);
        }
    }

    out
}

/// Lines that fit on one page: `floor((page_height - 2*margin) / line_height)`,
/// never less than one.
pub fn lines_per_page(page_height: f32, margin: f32, line_height: f32) -> usize {
    if line_height <= 0.0 {
        return 1;
    }
    let capacity = ((page_height - 2.0 * margin) / line_height).floor();
    if capacity < 1.0 {
        1
    } else {
        capacity as usize
    }
}

/// Distribute display lines over pages.
///
/// The first line of each page sits at `page_height - margin`; each line moves
/// down by `line_height`. A page is full once another line would drop below
/// `margin + line_height`.
pub fn paginate(
    lines: Vec<String>,
    page_height: f32,
    margin: f32,
    line_height: f32,
) -> Vec<Page> {
    let per_page = lines_per_page(page_height, margin, line_height);
    let top = page_height - margin;

    let mut pages = Vec::with_capacity(lines.len().div_ceil(per_page));
    let mut current = Page::default();

    for text in lines {
        if current.lines.len() == per_page {
            pages.push(std::mem::take(&mut current));
        }
        let slot = current.lines.len() as f32;
        current.lines.push(PlacedLine {
            text,
            y: top - slot * line_height,
        });
    }

    if !current.lines.is_empty() {
        pages.push(current);
    }

    pages
}
