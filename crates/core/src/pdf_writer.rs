//! Minimal PDF generation using lopdf.
//!
//! Two kinds of page are supported: text pages drawn with the standard
//! Helvetica font, and single-image pages where the image fills the page.

use crate::config::PageLayout;
use crate::error::{ConversionError, Result};
use crate::layout::Page;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

/// Raster data ready to be placed on a page.
#[derive(Debug, Clone)]
pub enum PdfImage {
    /// JPEG bytes embedded untouched with a DCT filter.
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        gray: bool,
    },
    /// 8-bit RGB samples with an optional 8-bit alpha plane.
    Rgb {
        pixels: Vec<u8>,
        alpha: Option<Vec<u8>>,
        width: u32,
        height: u32,
    },
}

impl PdfImage {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            PdfImage::Jpeg { width, height, .. } | PdfImage::Rgb { width, height, .. } => {
                (*width, *height)
            }
        }
    }
}

/// Incrementally builds a PDF document page by page.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    font_id: Option<ObjectId>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    /// Start an empty document.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            font_id: None,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    fn push_page(
        &mut self,
        width: f32,
        height: f32,
        operations: Vec<Operation>,
        resources: Dictionary,
    ) -> Result<()> {
        let content = Content { operations }
            .encode()
            .map_err(|e| ConversionError::encoding("Failed to encode page content", e))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Add a page of positioned text lines.
    pub fn add_text_page(&mut self, page: &Page, layout: &PageLayout) -> Result<()> {
        let font_id = self.font();
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Real(layout.font_size)]),
        ];
        for line in &page.lines {
            operations.push(Operation::new(
                "Tm",
                vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    1.into(),
                    Object::Real(layout.margin),
                    Object::Real(line.y),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        self.push_page(layout.page_width, layout.page_height, operations, resources)
    }

    /// Add a page sized to the image (1 pixel = 1 point) with the image
    /// filling it.
    pub fn add_image_page(&mut self, image: PdfImage) -> Result<()> {
        let (width, height) = image.dimensions();
        let image_id = self.add_image_object(image)?;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width as i64),
                    0.into(),
                    0.into(),
                    Object::Integer(height as i64),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        };
        self.push_page(width as f32, height as f32, operations, resources)
    }

    fn add_image_object(&mut self, image: PdfImage) -> Result<ObjectId> {
        match image {
            PdfImage::Jpeg {
                data,
                width,
                height,
                gray,
            } => {
                let color_space = if gray { "DeviceGray" } else { "DeviceRGB" };
                let mut stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => Object::Integer(width as i64),
                        "Height" => Object::Integer(height as i64),
                        "ColorSpace" => color_space,
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    data,
                );
                stream.allows_compression = false;
                Ok(self.doc.add_object(stream))
            }
            PdfImage::Rgb {
                pixels,
                alpha,
                width,
                height,
            } => {
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => Object::Integer(width as i64),
                    "Height" => Object::Integer(height as i64),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                };
                if let Some(alpha) = alpha {
                    let mask_id = self.doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => Object::Integer(width as i64),
                            "Height" => Object::Integer(height as i64),
                            "ColorSpace" => "DeviceGray",
                            "BitsPerComponent" => 8,
                        },
                        alpha,
                    ));
                    dict.set("SMask", mask_id);
                }
                Ok(self.doc.add_object(Stream::new(dict, pixels)))
            }
        }
    }

    /// Finish the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| ConversionError::encoding("Failed to write PDF", e))?;
        debug!("Wrote PDF with {} pages, {} bytes", count, buffer.len());
        Ok(buffer)
    }
}

/// Render laid-out text pages. An empty page list still yields one blank page.
pub fn render_text_pages(pages: &[Page], layout: &PageLayout) -> Result<Vec<u8>> {
    let mut builder = PdfBuilder::new();
    if pages.is_empty() {
        builder.add_text_page(&Page::default(), layout)?;
    }
    for page in pages {
        builder.add_text_page(page, layout)?;
    }
    builder.finish()
}

/// Encode text for a WinAnsi simple font. Latin-1 maps directly, the
/// typographic characters WinAnsi places in 0x80-0x9F map to their slots,
/// control characters become spaces and anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x00..=0x1F | 0x7F => b' ',
            code @ 0x20..=0x7E => code as u8,
            code @ 0xA0..=0xFF => code as u8,
            _ => win_ansi_high(c).unwrap_or(b'?'),
        })
        .collect()
}

/// WinAnsi (CP1252) codes 0x80-0x9F for characters outside Latin-1.
fn win_ansi_high(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80, // €
        '\u{201A}' => 0x82, // ‚
        '\u{0192}' => 0x83, // ƒ
        '\u{201E}' => 0x84, // „
        '\u{2026}' => 0x85, // …
        '\u{2020}' => 0x86, // †
        '\u{2021}' => 0x87, // ‡
        '\u{02C6}' => 0x88, // ˆ
        '\u{2030}' => 0x89, // ‰
        '\u{0160}' => 0x8A, // Š
        '\u{2039}' => 0x8B, // ‹
        '\u{0152}' => 0x8C, // Œ
        '\u{017D}' => 0x8E, // Ž
        '\u{2018}' => 0x91, // ‘
        '\u{2019}' => 0x92, // ’
        '\u{201C}' => 0x93, // “
        '\u{201D}' => 0x94, // ”
        '\u{2022}' => 0x95, // •
        '\u{2013}' => 0x96, // en dash
        '\u{2014}' => 0x97, // em dash
        '\u{02DC}' => 0x98, // ˜
        '\u{2122}' => 0x99, // ™
        '\u{0161}' => 0x9A, // š
        '\u{203A}' => 0x9B, // ›
        '\u{0153}' => 0x9C, // œ
        '\u{017E}' => 0x9E, // ž
        '\u{0178}' => 0x9F, // Ÿ
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PlacedLine;

    fn text_page(lines: &[&str]) -> Page {
        Page {
            lines: lines
                .iter()
                .enumerate()
                .map(|(i, text)| PlacedLine {
                    text: text.to_string(),
                    y: 742.0 - i as f32 * 14.4,
                })
                .collect(),
        }
    }

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(win_ansi("Ab1"), b"Ab1".to_vec());
        assert_eq!(win_ansi("é"), vec![0xE9]);
        assert_eq!(win_ansi("a\tb"), b"a b".to_vec());
        assert_eq!(win_ansi("日"), b"?".to_vec());
    }

    #[test]
    fn test_win_ansi_typographic_characters() {
        assert_eq!(
            win_ansi("It\u{2019}s \u{201C}fine\u{201D} \u{2014} ok"),
            b"It\x92s \x93fine\x94 \x97 ok".to_vec()
        );
        assert_eq!(win_ansi("\u{20AC}5 \u{2026} \u{2022} \u{2122}"), b"\x805 \x85 \x95 \x99".to_vec());
        // C1 controls have no glyph slot of their own
        assert_eq!(win_ansi("\u{0080}"), b"?".to_vec());
    }

    #[test]
    fn test_curly_quotes_reach_content_stream() {
        let page = text_page(&["It\u{2019}s \u{2013} ok"]);
        let bytes = render_text_pages(&[page], &PageLayout::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let content = doc.get_page_content(doc.get_pages()[&1]).unwrap();
        let needle = b"It\x92s \x96 ok";
        assert!(content.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_text_pdf_page_count() {
        let layout = PageLayout::default();
        let pages = vec![text_page(&["one", "two"]), text_page(&["three"])];
        let bytes = render_text_pages(&pages, &layout).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_empty_text_yields_one_page() {
        let bytes = render_text_pages(&[], &PageLayout::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_text_lands_in_content_stream() {
        let bytes = render_text_pages(&[text_page(&["Hello PDF"])], &PageLayout::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = doc.get_page_content(page_id).unwrap();
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("Hello PDF"));
    }

    #[test]
    fn test_image_page_is_sized_in_pixels() {
        let mut builder = PdfBuilder::new();
        builder
            .add_image_page(PdfImage::Rgb {
                pixels: vec![255; 4 * 3 * 3],
                alpha: None,
                width: 4,
                height: 3,
            })
            .unwrap();
        assert_eq!(builder.page_count(), 1);
        let bytes = builder.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        let page_id = pages[&1];
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 4.0);
        assert_eq!(media_box[3].as_float().unwrap(), 3.0);
    }
}
