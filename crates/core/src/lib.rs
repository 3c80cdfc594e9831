//! # fileconv-core
//!
//! Local file conversion between image, document and spreadsheet formats.
//!
//! Every conversion is checked against a fixed capability matrix, routed
//! by format category to a pipeline, and written next to the source (or into
//! a chosen output directory) with the target extension:
//!
//! - **Images** (png, jpg, jpeg, webp, gif, bmp, tiff): transcoding with
//!   optional aspect-preserving resize, or embedding into a one-page PDF
//! - **Documents** (txt, html, docx, pdf): plain text, HTML and paginated
//!   PDF output
//! - **Spreadsheets** (xlsx, csv): CSV, HTML tables, workbooks and row
//!   listings in PDF
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fileconv_core::{ConversionRequest, Converter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let converter = Converter::default();
//!
//!     let request = ConversionRequest::new("notes.txt", "pdf").with_output_dir("./output");
//!     let output = converter.convert(&request)?;
//!
//!     println!("Wrote {}", output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Processing with Progress
//!
//! ```rust,no_run
//! use fileconv_core::{CancellationToken, ConversionProgress, ConversionRequest, Converter};
//!
//! let converter = Converter::default();
//! let requests = vec![
//!     ConversionRequest::new("photo.png", "webp"),
//!     ConversionRequest::new("table.csv", "xlsx"),
//! ];
//!
//! let cancel = CancellationToken::new();
//! let batch = converter.convert_batch_with_progress(&requests, &cancel, |p: ConversionProgress| {
//!     println!("{}/{}: {}", p.completed, p.total, p.current_file);
//! });
//!
//! println!("{}", batch.summary());
//! ```

pub mod config;
pub mod converter;
pub mod document;
pub mod docx_reader;
pub mod error;
pub mod format;
pub mod html;
pub mod image_pipeline;
pub mod layout;
pub mod pdf_writer;
pub mod spreadsheet;
pub mod table;

// Re-export main types for convenience
pub use config::{
    BatchResult, ConversionOptions, ConversionProgress, ConversionRequest, ConversionResult,
    EngineConfig, PageLayout, DEFAULT_QUALITY,
};
pub use converter::{CancellationToken, Converter, ConverterBuilder};
pub use error::{ConversionError, ErrorKind, Result};
pub use format::{classify, is_supported, supported_targets, Format, FormatCategory};

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
