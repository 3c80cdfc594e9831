//! Document conversions, keyed by source format.

use crate::converter::ConversionJob;
use crate::docx_reader::DocxContent;
use crate::error::{ConversionError, Result};
use crate::html;
use crate::layout::TextDocument;
use crate::pdf_writer;
use tracing::debug;

/// txt → html: escaped text in a `<pre>` block.
pub fn text_to_html(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let text = job.read_source_text()?;
    Ok(html::text_page(&text).into_bytes())
}

/// txt → pdf: wrapped and paginated text.
pub fn text_to_pdf(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let text = job.read_source_text()?;
    paginated_pdf(job, &text)
}

/// txt → docx is listed but not implemented.
pub fn text_to_docx(_job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    Err(ConversionError::UnimplementedFeature(
        "Text to DOCX conversion".to_string(),
    ))
}

/// html → txt: tags stripped, entities decoded, whitespace collapsed.
pub fn html_to_text(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let markup = job.read_source_text()?;
    Ok(html::to_plain_text(&markup).into_bytes())
}

/// html → pdf is listed but not implemented.
pub fn html_to_pdf(_job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    Err(ConversionError::UnimplementedFeature(
        "HTML to PDF conversion".to_string(),
    ))
}

/// docx → txt: raw paragraph text.
pub fn docx_to_text(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let content = DocxContent::from_bytes(&job.read_source()?)?;
    Ok(content.raw_text().into_bytes())
}

/// docx → html: markup fragments inside the document page.
pub fn docx_to_html(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let content = DocxContent::from_bytes(&job.read_source()?)?;
    Ok(html::document_page(&content.to_html()).into_bytes())
}

/// docx → pdf: raw text only, paginated like a text file.
pub fn docx_to_pdf(job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    let content = DocxContent::from_bytes(&job.read_source()?)?;
    paginated_pdf(job, &content.raw_text())
}

/// Any conversion from pdf. Content extraction is out of scope.
pub fn from_pdf(_job: &ConversionJob<'_>) -> Result<Vec<u8>> {
    Err(ConversionError::UnimplementedFeature(
        "PDF input conversion".to_string(),
    ))
}

fn paginated_pdf(job: &ConversionJob<'_>, text: &str) -> Result<Vec<u8>> {
    let layout = &job.config.text_layout;
    let pages = TextDocument::from_text(text).layout(layout);
    debug!("Laid out text into {} pages", pages.len());
    pdf_writer::render_text_pages(&pages, layout)
}
