//! Format registry: known formats, their categories and the capability matrix.
//!
//! The matrix is a static table built at compile time and never mutated.
//! It is deliberately asymmetric: `pdf` is a target for every category but
//! only reaches `txt` and `html` as a source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A file format, identified by its lowercased extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Jpg,
    Jpeg,
    Webp,
    Gif,
    Bmp,
    Tiff,
    Txt,
    Html,
    Docx,
    Pdf,
    Xlsx,
    Csv,
}

/// Coarse grouping of formats that selects the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatCategory {
    Image,
    Document,
    Spreadsheet,
    Unknown,
}

const IMAGE_FORMATS: &[Format] = &[
    Format::Png,
    Format::Jpg,
    Format::Jpeg,
    Format::Webp,
    Format::Gif,
    Format::Bmp,
    Format::Tiff,
];
const DOCUMENT_FORMATS: &[Format] = &[Format::Txt, Format::Html, Format::Docx, Format::Pdf];
const SPREADSHEET_FORMATS: &[Format] = &[Format::Xlsx, Format::Csv];

/// Source format → reachable target formats.
const CAPABILITIES: &[(Format, &[Format])] = &[
    (
        Format::Png,
        &[Format::Jpg, Format::Jpeg, Format::Webp, Format::Gif, Format::Bmp, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Jpg,
        &[Format::Png, Format::Jpeg, Format::Webp, Format::Gif, Format::Bmp, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Jpeg,
        &[Format::Png, Format::Jpg, Format::Webp, Format::Gif, Format::Bmp, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Webp,
        &[Format::Png, Format::Jpg, Format::Jpeg, Format::Gif, Format::Bmp, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Gif,
        &[Format::Png, Format::Jpg, Format::Jpeg, Format::Webp, Format::Bmp, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Bmp,
        &[Format::Png, Format::Jpg, Format::Jpeg, Format::Webp, Format::Gif, Format::Tiff, Format::Pdf],
    ),
    (
        Format::Tiff,
        &[Format::Png, Format::Jpg, Format::Jpeg, Format::Webp, Format::Gif, Format::Bmp, Format::Pdf],
    ),
    (Format::Txt, &[Format::Pdf, Format::Html, Format::Docx]),
    (Format::Html, &[Format::Pdf, Format::Txt]),
    (Format::Docx, &[Format::Pdf, Format::Txt, Format::Html]),
    (Format::Pdf, &[Format::Txt, Format::Html]),
    (Format::Xlsx, &[Format::Csv, Format::Pdf, Format::Html]),
    (Format::Csv, &[Format::Xlsx, Format::Pdf, Format::Html]),
];

impl Format {
    /// Every known format.
    pub fn all() -> &'static [Format] {
        &[
            Format::Png,
            Format::Jpg,
            Format::Jpeg,
            Format::Webp,
            Format::Gif,
            Format::Bmp,
            Format::Tiff,
            Format::Txt,
            Format::Html,
            Format::Docx,
            Format::Pdf,
            Format::Xlsx,
            Format::Csv,
        ]
    }

    /// Parse an extension, case-insensitively, with or without a leading dot.
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim().trim_start_matches('.');
        Format::all()
            .iter()
            .copied()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Format of a path, from its extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
    }

    /// Lowercased file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpg => "jpg",
            Format::Jpeg => "jpeg",
            Format::Webp => "webp",
            Format::Gif => "gif",
            Format::Bmp => "bmp",
            Format::Tiff => "tiff",
            Format::Txt => "txt",
            Format::Html => "html",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
            Format::Xlsx => "xlsx",
            Format::Csv => "csv",
        }
    }

    /// Category from the fixed membership lists.
    pub fn category(self) -> FormatCategory {
        if IMAGE_FORMATS.contains(&self) {
            FormatCategory::Image
        } else if DOCUMENT_FORMATS.contains(&self) {
            FormatCategory::Document
        } else if SPREADSHEET_FORMATS.contains(&self) {
            FormatCategory::Spreadsheet
        } else {
            FormatCategory::Unknown
        }
    }

    /// Targets reachable from this format.
    pub fn targets(self) -> &'static [Format] {
        CAPABILITIES
            .iter()
            .find(|(source, _)| *source == self)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }

    /// Whether `target` is reachable from this format.
    pub fn can_convert_to(self, target: Format) -> bool {
        self.targets().contains(&target)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.extension())
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatCategory::Image => "image",
            FormatCategory::Document => "document",
            FormatCategory::Spreadsheet => "spreadsheet",
            FormatCategory::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Check whether a conversion between two format strings is in the matrix.
/// Unknown sources or targets yield `false`.
pub fn is_supported(source: &str, target: &str) -> bool {
    match (Format::from_extension(source), Format::from_extension(target)) {
        (Some(source), Some(target)) => source.can_convert_to(target),
        _ => false,
    }
}

/// Classify a format string; anything unrecognised is `Unknown`.
pub fn classify(format: &str) -> FormatCategory {
    Format::from_extension(format)
        .map(Format::category)
        .unwrap_or(FormatCategory::Unknown)
}

/// Targets reachable from a format string, empty for unknown sources.
pub fn supported_targets(source: &str) -> &'static [Format] {
    Format::from_extension(source)
        .map(Format::targets)
        .unwrap_or(&[])
}
