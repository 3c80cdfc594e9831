//! Dispatcher: validates requests against the capability matrix, routes them
//! to a pipeline handler and writes the output.
//!
//! Handlers build the whole output in memory. The bytes are written to a
//! temporary file next to the destination and renamed into place only when
//! everything succeeded, so a failed conversion never leaves a partial file
//! at the output path.

use crate::config::{
    BatchResult, ConversionOptions, ConversionProgress, ConversionRequest, ConversionResult,
    EngineConfig,
};
use crate::error::{ConversionError, Result};
use crate::format::{Format, FormatCategory};
use crate::{document, image_pipeline, spreadsheet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything a handler needs for one file.
#[derive(Debug, Clone, Copy)]
pub struct ConversionJob<'a> {
    pub source_path: &'a Path,
    pub source: Format,
    pub target: Format,
    pub options: &'a ConversionOptions,
    pub config: &'a EngineConfig,
}

impl ConversionJob<'_> {
    /// Read the whole source file.
    pub fn read_source(&self) -> Result<Vec<u8>> {
        std::fs::read(self.source_path).map_err(|e| ConversionError::io(self.source_path, e))
    }

    /// Read the source as text. Invalid UTF-8 is replaced, not rejected.
    pub fn read_source_text(&self) -> Result<String> {
        let data = self.read_source()?;
        Ok(match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

/// A pipeline entry point producing the output bytes.
pub type Handler = fn(&ConversionJob<'_>) -> Result<Vec<u8>>;

/// One row of the dispatch table. `None` matches any format.
struct Route {
    category: FormatCategory,
    source: Option<Format>,
    target: Option<Format>,
    handler: Handler,
}

const fn route(
    category: FormatCategory,
    source: Option<Format>,
    target: Option<Format>,
    handler: Handler,
) -> Route {
    Route {
        category,
        source,
        target,
        handler,
    }
}

/// First match wins, so specific rows precede wildcard rows.
static ROUTES: &[Route] = &[
    route(FormatCategory::Image, None, Some(Format::Pdf), image_pipeline::to_pdf),
    route(FormatCategory::Image, None, None, image_pipeline::transcode),
    route(FormatCategory::Document, Some(Format::Txt), Some(Format::Html), document::text_to_html),
    route(FormatCategory::Document, Some(Format::Txt), Some(Format::Pdf), document::text_to_pdf),
    route(FormatCategory::Document, Some(Format::Txt), Some(Format::Docx), document::text_to_docx),
    route(FormatCategory::Document, Some(Format::Html), Some(Format::Txt), document::html_to_text),
    route(FormatCategory::Document, Some(Format::Html), Some(Format::Pdf), document::html_to_pdf),
    route(FormatCategory::Document, Some(Format::Docx), Some(Format::Txt), document::docx_to_text),
    route(FormatCategory::Document, Some(Format::Docx), Some(Format::Html), document::docx_to_html),
    route(FormatCategory::Document, Some(Format::Docx), Some(Format::Pdf), document::docx_to_pdf),
    route(FormatCategory::Document, Some(Format::Pdf), None, document::from_pdf),
    route(FormatCategory::Spreadsheet, Some(Format::Xlsx), Some(Format::Csv), spreadsheet::xlsx_to_csv),
    route(FormatCategory::Spreadsheet, Some(Format::Xlsx), Some(Format::Html), spreadsheet::xlsx_to_html),
    route(FormatCategory::Spreadsheet, Some(Format::Xlsx), Some(Format::Pdf), spreadsheet::xlsx_to_pdf),
    route(FormatCategory::Spreadsheet, Some(Format::Csv), Some(Format::Xlsx), spreadsheet::csv_to_xlsx),
    route(FormatCategory::Spreadsheet, Some(Format::Csv), Some(Format::Html), spreadsheet::csv_to_html),
    route(FormatCategory::Spreadsheet, Some(Format::Csv), Some(Format::Pdf), spreadsheet::csv_to_pdf),
];

/// Look up the handler for a classified pair.
pub fn handler_for(category: FormatCategory, source: Format, target: Format) -> Option<Handler> {
    ROUTES
        .iter()
        .find(|r| {
            r.category == category
                && r.source.map_or(true, |s| s == source)
                && r.target.map_or(true, |t| t == target)
        })
        .map(|r| r.handler)
}

/// Cooperative cancellation flag for batches. Checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The current file still runs to completion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The conversion engine. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: EngineConfig,
}

impl Converter {
    /// Create a converter with the given configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Convert a single file.
    ///
    /// Matrix and category failures are returned as-is; anything raised by
    /// a pipeline comes back wrapped in [`ConversionError::Failed`].
    pub fn convert(&self, request: &ConversionRequest) -> Result<PathBuf> {
        let source_name = request.source_format();
        let target_name = request.target_format_normalized();

        let (source, target) = match (
            Format::from_extension(&source_name),
            Format::from_extension(&target_name),
        ) {
            (Some(source), Some(target)) if source.can_convert_to(target) => (source, target),
            _ => {
                return Err(ConversionError::UnsupportedConversion {
                    source_format: source_name,
                    target_format: target_name,
                })
            }
        };

        let category = source.category();
        if category == FormatCategory::Unknown {
            return Err(ConversionError::UnsupportedCategory {
                format: source_name,
            });
        }

        let start = Instant::now();
        info!("Converting {:?} to {}", request.source_path, target);

        let output_path = self
            .run_pipeline(request, category, source, target)
            .map_err(ConversionError::wrap)?;

        info!(
            "Converted {:?} -> {:?} in {:?}",
            request.source_path,
            output_path,
            start.elapsed()
        );
        Ok(output_path)
    }

    fn run_pipeline(
        &self,
        request: &ConversionRequest,
        category: FormatCategory,
        source: Format,
        target: Format,
    ) -> Result<PathBuf> {
        request.options.validate()?;
        let output_path = request.output_path(target)?;

        let handler = handler_for(category, source, target).ok_or_else(|| {
            // Every matrix pair has a route; reaching this is a table bug.
            ConversionError::UnsupportedConversion {
                source_format: source.to_string(),
                target_format: target.to_string(),
            }
        })?;
        debug!("Routing {} {} -> {}", category, source, target);

        let job = ConversionJob {
            source_path: &request.source_path,
            source,
            target,
            options: &request.options,
            config: &self.config,
        };
        let bytes = handler(&job)?;
        write_atomically(&output_path, &bytes)?;
        Ok(output_path)
    }

    /// Convert one file and record the outcome instead of returning an error.
    pub fn convert_to_result(&self, request: &ConversionRequest) -> ConversionResult {
        let start = Instant::now();
        match self.convert(request) {
            Ok(output_path) => ConversionResult::succeeded(
                request.source_path.clone(),
                output_path,
                start.elapsed(),
            ),
            Err(e) => {
                error!("Failed to convert {:?}: {}", request.source_path, e);
                ConversionResult::failed(request.source_path.clone(), &e, start.elapsed())
            }
        }
    }

    /// Convert multiple files in order.
    pub fn convert_batch(&self, requests: &[ConversionRequest]) -> BatchResult {
        self.convert_batch_with_progress(requests, &CancellationToken::new(), |_| {})
    }

    /// Convert multiple files in order, reporting after each file and
    /// checking `cancel` before starting the next one.
    ///
    /// A failing file never stops the batch. On cancellation the results
    /// gathered so far are returned with `cancelled` set.
    pub fn convert_batch_with_progress<F>(
        &self,
        requests: &[ConversionRequest],
        cancel: &CancellationToken,
        mut progress_callback: F,
    ) -> BatchResult
    where
        F: FnMut(ConversionProgress),
    {
        let start = Instant::now();
        let total = requests.len();
        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;

        for (index, request) in requests.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} files", index, total);
                cancelled = true;
                break;
            }

            let result = self.convert_to_result(request);
            progress_callback(ConversionProgress {
                completed: index + 1,
                total,
                current_file: request.file_name(),
                success: result.success,
            });
            results.push(result);
        }

        let batch = BatchResult {
            results,
            total_files: total,
            cancelled,
            total_duration: start.elapsed(),
        };
        info!("{}", batch.summary());
        batch
    }
}

/// Builder for creating a Converter with custom settings.
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    config: EngineConfig,
}

impl ConverterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size for text documents rendered to PDF.
    pub fn text_font_size(mut self, size: f32) -> Self {
        self.config.text_layout.font_size = size;
        self
    }

    /// Set the font size for row listings rendered to PDF.
    pub fn table_font_size(mut self, size: f32) -> Self {
        self.config.table_layout.font_size = size;
        self
    }

    /// Set the page margin for all PDF output.
    pub fn margin(mut self, margin: f32) -> Self {
        self.config.text_layout.margin = margin;
        self.config.table_layout.margin = margin;
        self
    }

    /// Set the page size for all PDF output.
    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.config.text_layout = self.config.text_layout.page_size(width, height);
        self.config.table_layout = self.config.table_layout.page_size(width, height);
        self
    }

    /// Build the converter.
    pub fn build(self) -> Result<Converter> {
        Converter::new(self.config)
    }
}

/// Write `bytes` to a temp file in the destination directory, then rename it
/// over `path`. The temp file is removed on any failure.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ConversionError::io(&dir, e))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".fileconv-")
        .tempfile_in(&dir)
        .map_err(|e| ConversionError::io(&dir, e))?;
    if let Err(e) = temp.write_all(bytes).and_then(|_| temp.flush()) {
        return Err(ConversionError::io(temp.path(), e));
    }

    temp.persist(path).map_err(|e| {
        warn!("Discarding temp output for {:?}", path);
        ConversionError::io(path, e.error)
    })?;
    Ok(())
}
