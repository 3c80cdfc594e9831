//! Configuration and request/result types for file conversion.

use crate::error::{ConversionError, ErrorKind, Result};
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default encoder quality for lossy codecs.
pub const DEFAULT_QUALITY: u8 = 90;

/// Per-request conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Encoder quality for lossy codecs, 1-100.
    /// Default: 90.
    pub quality: u8,

    /// Bounding-box width for image resizing.
    pub width: Option<u32>,

    /// Bounding-box height for image resizing.
    pub height: Option<u32>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            width: None,
            height: None,
        }
    }
}

impl ConversionOptions {
    /// Options with the given quality.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality,
            ..Default::default()
        }
    }

    /// Set the resize box width.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the resize box height.
    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Whether a resize was requested.
    pub fn wants_resize(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConversionError::InvalidOptions(
                "quality must be between 1 and 100".to_string(),
            ));
        }
        if self.width == Some(0) {
            return Err(ConversionError::InvalidOptions(
                "width must be a positive integer".to_string(),
            ));
        }
        if self.height == Some(0) {
            return Err(ConversionError::InvalidOptions(
                "height must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page geometry for paginated text output, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        // A4
        Self {
            page_width: 595.28,
            page_height: 841.89,
            margin: 50.0,
            font_size: 12.0,
        }
    }
}

impl PageLayout {
    /// A4 layout with the given font size.
    pub fn with_font_size(font_size: f32) -> Self {
        Self {
            font_size,
            ..Default::default()
        }
    }

    /// Set the margin.
    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Vertical advance per line.
    pub fn line_height(&self) -> f32 {
        self.font_size * 1.2
    }

    /// Approximate characters per line for the usable width.
    pub fn char_budget(&self) -> usize {
        let usable = self.page_width - 2.0 * self.margin;
        (usable / (self.font_size * 0.6)).floor().max(0.0) as usize
    }

    /// Validate the layout.
    pub fn validate(&self) -> Result<()> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(ConversionError::InvalidOptions(
                "page dimensions must be positive".to_string(),
            ));
        }
        if self.font_size <= 0.0 {
            return Err(ConversionError::InvalidOptions(
                "font_size must be positive".to_string(),
            ));
        }
        if self.margin < 0.0
            || 2.0 * self.margin >= self.page_width
            || 2.0 * self.margin >= self.page_height
        {
            return Err(ConversionError::InvalidOptions(
                "margin must leave a printable area".to_string(),
            ));
        }
        Ok(())
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Layout for free text (txt, docx) rendered to PDF.
    pub text_layout: PageLayout,

    /// Layout for row listings (csv, xlsx) rendered to PDF.
    pub table_layout: PageLayout,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_layout: PageLayout::with_font_size(12.0),
            table_layout: PageLayout::with_font_size(10.0),
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| ConversionError::io(path, e))?;
        let config: EngineConfig = serde_json::from_slice(&data).map_err(|e| {
            ConversionError::InvalidOptions(format!("invalid config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        self.text_layout.validate()?;
        self.table_layout.validate()?;
        Ok(())
    }
}

/// A single conversion request. Immutable once handed to the converter.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    /// Path to the source file.
    pub source_path: PathBuf,

    /// Target format string, e.g. `"pdf"`.
    pub target_format: String,

    /// Directory for the output file. Default: the source's directory.
    pub output_dir: Option<PathBuf>,

    /// Conversion options.
    pub options: ConversionOptions,
}

impl ConversionRequest {
    /// Create a new conversion request.
    pub fn new(source_path: impl Into<PathBuf>, target_format: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_format: target_format.into(),
            output_dir: None,
            options: ConversionOptions::default(),
        }
    }

    /// Write the output into `dir` instead of beside the source.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Source format string: the lowercased extension, empty if none.
    pub fn source_format(&self) -> String {
        self.source_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }

    /// Target format string, lowercased and without a leading dot.
    pub fn target_format_normalized(&self) -> String {
        self.target_format
            .trim()
            .trim_start_matches('.')
            .to_lowercase()
    }

    /// Output path: source stem + target extension, inside the output dir.
    pub fn output_path(&self, target: Format) -> Result<PathBuf> {
        let stem = self
            .source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ConversionError::InvalidRequest(format!(
                    "source path has no file name: {}",
                    self.source_path.display()
                ))
            })?;

        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .source_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        Ok(dir.join(format!("{}.{}", stem, target.extension())))
    }

    /// Display name for progress reporting.
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub input_path: PathBuf,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Wall time spent on this file.
    #[serde(skip)]
    pub duration: Duration,
}

impl ConversionResult {
    /// A successful result.
    pub fn succeeded(input_path: PathBuf, output_path: PathBuf, duration: Duration) -> Self {
        Self {
            input_path,
            success: true,
            output_path: Some(output_path),
            error: None,
            error_kind: None,
            duration,
        }
    }

    /// A failed result carrying the error's message and kind.
    pub fn failed(input_path: PathBuf, error: &ConversionError, duration: Duration) -> Self {
        Self {
            input_path,
            success: false,
            output_path: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            duration,
        }
    }
}

/// Progress after one file of a batch completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Files finished so far, including the current one.
    pub completed: usize,

    /// Total number of files in the batch.
    pub total: usize,

    /// Name of the file that just finished.
    pub current_file: String,

    /// Whether that file converted successfully.
    pub success: bool,
}

impl ConversionProgress {
    /// Completed share of the batch in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Result of a batch conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// One entry per attempted file, in input order.
    pub results: Vec<ConversionResult>,

    /// Number of files submitted.
    pub total_files: usize,

    /// Whether the batch stopped early on a cancellation request.
    pub cancelled: bool,

    /// Total processing time.
    #[serde(skip)]
    pub total_duration: Duration,
}

impl BatchResult {
    /// Number of successful conversions.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of failed conversions.
    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// Human-readable summary line.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} of {} files converted successfully",
            self.success_count(),
            self.total_files
        );
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}
